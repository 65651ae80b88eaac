//! File-level resize workflow testing
//!
//! Exercises the public resize API end to end: decode, resample, encode, and
//! the verbatim-copy passthrough when no size is requested.

use bgcutout::{error::CutoutError, resize_image, SizeSpec};
use image::{DynamicImage, Rgb, RgbImage};
use std::fs;
use tempfile::TempDir;

fn write_test_image(dir: &TempDir, name: &str, width: u32, height: u32) -> std::path::PathBuf {
    let mut image = RgbImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        *pixel = Rgb([(x % 256) as u8, (y % 256) as u8, 128]);
    }
    let path = dir.path().join(name);
    DynamicImage::ImageRgb8(image).save(&path).unwrap();
    path
}

#[test]
fn scale_resize_halves_both_dimensions() {
    let dir = TempDir::new().unwrap();
    let input = write_test_image(&dir, "input.png", 200, 100);
    let output = dir.path().join("output.png");

    let written = resize_image(&input, &output, &SizeSpec::Scale(50.0)).unwrap();
    assert_eq!(written, output);

    let resized = image::open(&output).unwrap();
    assert_eq!((resized.width(), resized.height()), (100, 50));
}

#[test]
fn dimension_resize_is_exact_even_when_aspect_changes() {
    let dir = TempDir::new().unwrap();
    let input = write_test_image(&dir, "input.png", 200, 100);
    let output = dir.path().join("square.png");

    resize_image(
        &input,
        &output,
        &SizeSpec::Dimensions {
            width: 64,
            height: 64,
        },
    )
    .unwrap();

    let resized = image::open(&output).unwrap();
    assert_eq!((resized.width(), resized.height()), (64, 64));
}

#[test]
fn unspecified_size_copies_bytes_verbatim() {
    let dir = TempDir::new().unwrap();
    let input = write_test_image(&dir, "input.png", 40, 30);
    let output = dir.path().join("copy.png");

    resize_image(&input, &output, &SizeSpec::Unspecified).unwrap();

    let original = fs::read(&input).unwrap();
    let copied = fs::read(&output).unwrap();
    assert_eq!(original, copied, "passthrough must not re-encode");
}

#[test]
fn upscale_writes_the_larger_image() {
    let dir = TempDir::new().unwrap();
    let input = write_test_image(&dir, "small.png", 16, 16);
    let output = dir.path().join("big.png");

    resize_image(&input, &output, &SizeSpec::Scale(400.0)).unwrap();

    let resized = image::open(&output).unwrap();
    assert_eq!((resized.width(), resized.height()), (64, 64));
}

#[test]
fn output_format_follows_extension() {
    let dir = TempDir::new().unwrap();
    let input = write_test_image(&dir, "input.png", 32, 32);
    let output = dir.path().join("output.jpg");

    resize_image(&input, &output, &SizeSpec::Scale(50.0)).unwrap();

    let format = image::ImageFormat::from_path(&output).unwrap();
    assert_eq!(format, image::ImageFormat::Jpeg);
    assert!(image::open(&output).is_ok());
}

#[test]
fn missing_input_fails_before_touching_output() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("never_written.png");

    let err = resize_image(
        dir.path().join("missing.png"),
        &output,
        &SizeSpec::Scale(50.0),
    )
    .unwrap_err();

    assert!(matches!(err, CutoutError::InputNotFound(_)));
    assert!(!output.exists());
}

#[test]
fn undecodable_input_reports_the_path() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("garbage.png");
    fs::write(&input, b"not an image at all").unwrap();

    let err = resize_image(&input, dir.path().join("out.png"), &SizeSpec::Scale(50.0))
        .unwrap_err();
    assert!(err.to_string().contains("garbage.png"));
}
