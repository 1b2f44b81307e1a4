use super::*;

use image::{Rgba, RgbaImage};

fn tiny_png() -> Vec<u8> {
    let img = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 128]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut out, ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

#[tokio::test]
async fn png_bytes_are_written_verbatim_and_folder_is_created() {
    let root = tempfile::tempdir().expect("tempdir");
    let folder = root.path().join("SaveImages").join("nested");
    let bytes = b"not really a png but stored as-is".to_vec();

    let path = FsImageStore
        .save(&bytes, &folder, "image_20240101_120000.png")
        .await
        .expect("save");

    assert_eq!(path, folder.join("image_20240101_120000.png"));
    assert_eq!(std::fs::read(&path).expect("read"), bytes);
}

#[tokio::test]
async fn existing_file_is_overwritten() {
    let root = tempfile::tempdir().expect("tempdir");

    FsImageStore
        .save(b"first", root.path(), "same.png")
        .await
        .expect("first save");
    let path = FsImageStore
        .save(b"second", root.path(), "same.png")
        .await
        .expect("second save");

    assert_eq!(std::fs::read(path).expect("read"), b"second");
}

#[tokio::test]
async fn jpeg_target_is_transcoded() {
    let root = tempfile::tempdir().expect("tempdir");

    let path = FsImageStore
        .save(&tiny_png(), root.path(), "photo.JPG")
        .await
        .expect("save");

    let written = std::fs::read(path).expect("read");
    assert_eq!(
        image::guess_format(&written).expect("format"),
        ImageFormat::Jpeg
    );
}

#[tokio::test]
async fn unsupported_extension_fails_distinctly_without_touching_disk() {
    let root = tempfile::tempdir().expect("tempdir");
    let folder = root.path().join("never-created");

    let err = FsImageStore
        .save(b"bytes", &folder, "image.gif")
        .await
        .expect_err("unsupported");

    assert!(matches!(err, SaveError::UnsupportedExtension(ref ext) if ext == "gif"));
    assert!(!folder.exists());
}

#[tokio::test]
async fn undecodable_bytes_for_jpeg_target_are_an_encode_error() {
    let root = tempfile::tempdir().expect("tempdir");

    let err = FsImageStore
        .save(b"garbage", root.path(), "image.jpeg")
        .await
        .expect_err("encode");

    assert!(matches!(err, SaveError::Encode(_)));
}

#[tokio::test]
async fn folder_path_that_is_a_file_is_an_io_error() {
    let root = tempfile::tempdir().expect("tempdir");
    let blocker = root.path().join("blocker");
    std::fs::write(&blocker, b"file").expect("write blocker");

    let err = FsImageStore
        .save(b"bytes", &blocker, "image.png")
        .await
        .expect_err("io");

    assert!(matches!(err, SaveError::Io(_)));
}
