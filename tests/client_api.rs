//! End-to-end use of the public API with an in-process transport.
//!
//! The transport here stands in for the service: it records every URL it is
//! asked for and answers with a canned image.

use fotocrib::{
    ClientConfig, DecodeStrategy, Error, FetchedImage, Format, Fotocrib, ImageRequestState,
    Operation, Transport, TransportError,
};
use image::{DynamicImage, ImageFormat, RgbImage};
use reqwest::Url;
use std::cell::RefCell;
use std::io::Cursor;
use tempfile::TempDir;

struct CannedService {
    body: Vec<u8>,
    seen: RefCell<Vec<Url>>,
}

impl CannedService {
    fn new(body: Vec<u8>) -> Self {
        Self {
            body,
            seen: RefCell::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.seen.borrow().len()
    }

    fn last_query(&self) -> Vec<(String, String)> {
        let seen = self.seen.borrow();
        let url = seen.last().expect("no request was made");
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }
}

impl Transport for CannedService {
    fn fetch(&self, url: &Url) -> Result<FetchedImage, TransportError> {
        self.seen.borrow_mut().push(url.clone());
        Ok(FetchedImage {
            bytes: self.body.clone(),
            content_type: None,
        })
    }
}

fn image_bytes(format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(6, 4, image::Rgb([200, 30, 30])));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
}

fn client<'a>(
    dir: &TempDir,
    source: &str,
    name: &str,
    format: &str,
    service: &'a CannedService,
) -> Fotocrib<&'a CannedService> {
    let config = ClientConfig {
        output_dir: dir.path().to_path_buf(),
        ..ClientConfig::default()
    };
    let state = ImageRequestState::new(source, name, format).unwrap();
    Fotocrib::with_transport(state, config, service).unwrap()
}

fn pairs(expected: &[(&str, &str)]) -> Vec<(String, String)> {
    expected
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn three_images_in_sequence() {
    let tmp = TempDir::new().unwrap();
    let service = CannedService::new(image_bytes(ImageFormat::Jpeg));
    let mut fotocrib = client(&tmp, "http://fotocrib.com/images/lion.jpg", "lion", "png", &service);

    fotocrib.repaint(5, 44, 10).unwrap();

    fotocrib.set_source("http://fotocrib.com/images/lara.jpg").unwrap();
    fotocrib.set_file_name("lara").unwrap();
    fotocrib.set_format("jpg").unwrap();
    fotocrib.round_corners(44).unwrap();

    fotocrib.set_source("http://fotocrib.com/images/jubei.jpg").unwrap();
    fotocrib.set_file_name("jubei").unwrap();
    fotocrib.set_format("gif").unwrap();
    fotocrib.cube(255, 255, 255).unwrap();

    assert_eq!(service.calls(), 3);
    assert_eq!(
        service.last_query(),
        pairs(&[
            ("s", "http://fotocrib.com/images/jubei.jpg"),
            ("q", "cube"),
            ("r", "255"),
            ("g", "255"),
            ("b", "255"),
        ])
    );

    let lion = std::fs::read(tmp.path().join("lion.png")).unwrap();
    let lara = std::fs::read(tmp.path().join("lara.jpg")).unwrap();
    let jubei = std::fs::read(tmp.path().join("jubei.gif")).unwrap();
    assert_eq!(image::guess_format(&lion).unwrap(), ImageFormat::Png);
    assert_eq!(image::guess_format(&jubei).unwrap(), ImageFormat::Gif);
    // Same format in and out: written untouched.
    assert_eq!(lara, service.body);
}

#[test]
fn round_frame_wire_parameters() {
    let tmp = TempDir::new().unwrap();
    let service = CannedService::new(image_bytes(ImageFormat::Png));
    let mut fotocrib = client(&tmp, "https://cdn.example.com/a.png", "a", "png", &service);

    let outcome = fotocrib.round_frame(6, 20, 0, 0, 0).unwrap();

    assert!(!outcome.reencoded);
    assert_eq!(outcome.output_format, Format::Png);
    assert_eq!(
        service.last_query(),
        pairs(&[
            ("s", "https://cdn.example.com/a.png"),
            ("q", "rframe"),
            ("r", "0"),
            ("g", "0"),
            ("b", "0"),
            ("t", "6"),
            ("v", "20"),
        ])
    );
}

#[test]
fn validation_failures_never_reach_the_service() {
    let tmp = TempDir::new().unwrap();
    let service = CannedService::new(image_bytes(ImageFormat::Png));
    let mut fotocrib = client(&tmp, "http://x/lion.jpg", "lion", "png", &service);

    assert!(matches!(
        fotocrib.scale("half"),
        Err(Error::NonNumericArgument { operation: "scale", .. })
    ));
    assert!(matches!(
        fotocrib.label("hi", "Diagonal"),
        Err(Error::InvalidLocation(_))
    ));
    assert!(matches!(
        fotocrib.set_source("lion.jpg"),
        Err(Error::InvalidSource(_))
    ));
    assert!(matches!(
        fotocrib.set_format("tiff"),
        Err(Error::UnsupportedFormat(_))
    ));
    assert!(matches!(fotocrib.set_file_name(""), Err(Error::InvalidFileName)));
    assert!(matches!(fotocrib.set_file_name("sub/"), Err(Error::InvalidFileName)));

    assert_eq!(service.calls(), 0);
    assert_eq!(fotocrib.source(), "http://x/lion.jpg");
    assert_eq!(fotocrib.format(), Format::Png);
    assert!(!fotocrib.destination().exists());
}

#[test]
fn plan_matches_what_apply_sends() {
    let tmp = TempDir::new().unwrap();
    let service = CannedService::new(image_bytes(ImageFormat::Png));
    let mut fotocrib = client(&tmp, "http://x/lion.png", "lion", "png", &service);
    let op = Operation::label("hello world", "NorthWest");

    let planned = fotocrib.plan(&op).unwrap();
    fotocrib.apply(op.clone()).unwrap();

    assert_eq!(service.seen.borrow()[0], planned);
    assert_eq!(fotocrib.last_operation(), Some(&op));
}

#[test]
fn source_extension_strategy_trusts_the_url() {
    let tmp = TempDir::new().unwrap();
    // PNG bytes behind a .jpg URL: only sniffing can decode this.
    let service = CannedService::new(image_bytes(ImageFormat::Png));
    let config = ClientConfig {
        output_dir: tmp.path().to_path_buf(),
        decode: DecodeStrategy::SourceExtension,
        ..ClientConfig::default()
    };
    let state = ImageRequestState::new("http://x/lion.jpg", "lion", "png").unwrap();
    let mut fotocrib = Fotocrib::with_transport(state, config, &service).unwrap();

    let result = fotocrib.thumbnail();

    assert!(matches!(result, Err(Error::DecodeFailure(_))));
    assert!(!tmp.path().join("lion.png").exists());
}

#[test]
fn invalid_config_is_rejected_before_any_request() {
    let service = CannedService::new(image_bytes(ImageFormat::Png));
    let state = ImageRequestState::new("http://x/lion.jpg", "lion", "png").unwrap();
    let config = ClientConfig {
        endpoint: "ftp://x/fototools.php".into(),
        timeout_secs: 0,
        ..ClientConfig::default()
    };

    let result = Fotocrib::with_transport(state, config, &service);

    assert!(matches!(result, Err(Error::InvalidConfig(_))));
    assert_eq!(service.calls(), 0);
}
