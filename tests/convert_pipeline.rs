use std::io::{Cursor, Read};

use gpxqr::label::LabelFont;
use gpxqr::output::write_previews;
use gpxqr::{Error, QrDecoder, RenderOptions, convert, generate, track};
use image::imageops;
use zip::ZipArchive;

const HIKE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="gpxqr-tests" xmlns="http://www.topografix.com/GPX/1/1">
  <wpt lat="45.0" lon="-122.0"><name>Camp1</name></wpt>
  <wpt lat="45.3712" lon="-121.6959"><name>Summit</name></wpt>
  <wpt lat="45.25" lon="-121.75"><name>Lake</name></wpt>
  <trk><name>Route</name><trkseg>
    <trkpt lat="45.0" lon="-122.0"></trkpt>
    <trkpt lat="45.1" lon="-121.9"></trkpt>
  </trkseg></trk>
</gpx>"#;

const DUPLICATE_NAMES: &str = r#"<gpx version="1.1" creator="gpxqr-tests">
  <wpt lat="10.0" lon="20.0"><name>Spring</name></wpt>
  <wpt lat="11.5" lon="21.5"><name>Spring</name></wpt>
</gpx>"#;

const SLASHED_NAMES: &str = r#"<gpx version="1.1" creator="gpxqr-tests">
  <wpt lat="1.0" lon="2.0"><name>a/b</name></wpt>
  <wpt lat="3.0" lon="4.0"><name>x/../../escaped</name></wpt>
  <wpt lat="5.0" lon="6.0"><name>..\up</name></wpt>
</gpx>"#;

const NO_WAYPOINTS: &str = r#"<gpx version="1.1" creator="gpxqr-tests"></gpx>"#;

fn open_zip(bytes: Vec<u8>) -> ZipArchive<Cursor<Vec<u8>>> {
    ZipArchive::new(Cursor::new(bytes)).expect("archive should be a valid zip")
}

fn read_entry(zip: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> Vec<u8> {
    let mut data = Vec::new();
    zip.by_name(name)
        .expect("entry present")
        .read_to_end(&mut data)
        .expect("read entry");
    data
}

fn large_codes() -> RenderOptions {
    RenderOptions {
        image_width: 234,
        image_height: 234,
        ..RenderOptions::default()
    }
}

#[test]
fn one_image_per_waypoint() {
    let archive = convert(HIKE.as_bytes(), "hike", &RenderOptions::default()).expect("convert");
    assert_eq!(archive.len(), 3);

    let zip = open_zip(archive.into_bytes());
    assert_eq!(zip.len(), 3, "tracks must not produce labels");
}

#[test]
fn entry_names_follow_filename_template() {
    let archive = convert(HIKE.as_bytes(), "hike", &RenderOptions::default()).expect("convert");
    assert_eq!(
        archive.entries(),
        ["hike_Camp1.png", "hike_Summit.png", "hike_Lake.png"]
    );

    let zip = open_zip(archive.into_bytes());
    let mut names: Vec<&str> = zip.file_names().collect();
    names.sort_unstable();
    assert_eq!(names, vec!["hike_Camp1.png", "hike_Lake.png", "hike_Summit.png"]);
    assert!(names.iter().all(|name| !name.contains('/')));
}

#[test]
fn map_url_round_trips_through_qr_code() {
    let options = large_codes();
    let labels = generate(HIKE.as_bytes(), "hike", &options).expect("generate");

    let camp = &labels[0];
    assert_eq!(camp.title, "Camp1");
    assert_eq!(camp.url, "http://maps.google.com/?q=45.0,-122.0");

    let code = imageops::crop_imm(&camp.image, 0, 0, 234, 234).to_image();
    let decoded = QrDecoder::new().decode_rgb(&code).expect("decode camp code");
    assert_eq!(decoded.as_str(), Some("http://maps.google.com/?q=45.0,-122.0"));

    let summit = &labels[1];
    let code = imageops::crop_imm(&summit.image, 0, 0, 234, 234).to_image();
    let decoded = QrDecoder::new().decode_rgb(&code).expect("decode summit code");
    assert_eq!(decoded.as_str(), Some(summit.url.as_str()));
    assert_eq!(summit.url, "http://maps.google.com/?q=45.3712,-121.6959");
}

#[test]
fn label_dimensions_follow_layout() {
    let options = RenderOptions::default();
    let labels = generate(HIKE.as_bytes(), "hike", &options).expect("generate");
    let font = LabelFont::builtin(options.font_size);

    for label in &labels {
        let text_height = font.measure(&label.title).height();
        assert_eq!(label.image.width(), 78);
        assert_eq!(label.image.height(), 78 + text_height + 10);
    }
}

#[test]
fn archived_images_match_generated_labels() {
    let options = RenderOptions::default();
    let labels = generate(HIKE.as_bytes(), "hike", &options).expect("generate");
    let archive = convert(HIKE.as_bytes(), "hike", &options).expect("convert");

    let mut zip = open_zip(archive.into_bytes());
    for label in &labels {
        let data = read_entry(&mut zip, &label.filename);
        let decoded = image::load_from_memory(&data).expect("png entry").to_rgb8();
        assert_eq!(decoded, label.image, "entry {} differs", label.filename);
    }
}

#[test]
fn duplicate_stems_keep_last_waypoint() {
    let options = RenderOptions {
        filename_template: "{wp.name}".to_string(),
        ..large_codes()
    };
    let labels = generate(DUPLICATE_NAMES.as_bytes(), "springs", &options).expect("generate");
    assert_eq!(labels.len(), 2);

    let archive = convert(DUPLICATE_NAMES.as_bytes(), "springs", &options).expect("convert");
    assert_eq!(archive.entries(), ["Spring.png"]);

    let mut zip = open_zip(archive.into_bytes());
    assert_eq!(zip.len(), 1);
    let data = read_entry(&mut zip, "Spring.png");
    let kept = image::load_from_memory(&data).expect("png entry").to_rgb8();
    assert_eq!(kept, labels[1].image);

    let code = imageops::crop_imm(&kept, 0, 0, 234, 234).to_image();
    let decoded = QrDecoder::new().decode_rgb(&code).expect("decode kept code");
    assert_eq!(decoded.as_str(), Some("http://maps.google.com/?q=11.5,21.5"));
}

#[test]
fn empty_track_gives_empty_archive() {
    let archive = convert(NO_WAYPOINTS.as_bytes(), "empty", &RenderOptions::default())
        .expect("empty track converts");
    assert!(archive.is_empty());
    assert_eq!(open_zip(archive.into_bytes()).len(), 0);
}

#[test]
fn malformed_track_is_a_parse_error() {
    let err = convert(b"<gpx><wpt", "broken", &RenderOptions::default()).unwrap_err();
    assert!(matches!(err, Error::Parse(_)), "unexpected error: {err}");
}

#[test]
fn unknown_placeholder_aborts_before_parsing() {
    let options = RenderOptions {
        url_template: "http://example.com/{wp.elevation}".to_string(),
        ..RenderOptions::default()
    };
    // The track is malformed too; the template error must win.
    let err = convert(b"not gpx", "x", &options).unwrap_err();
    assert!(matches!(err, Error::Template { .. }), "unexpected error: {err}");
}

#[test]
fn oversized_url_aborts_the_batch() {
    let options = RenderOptions {
        url_template: format!("http://example.com/{}?{{wp.name}}", "p".repeat(1400)),
        ..RenderOptions::default()
    };
    let err = generate(HIKE.as_bytes(), "hike", &options).unwrap_err();
    assert!(matches!(err, Error::Encoding(_)), "unexpected error: {err}");
}

#[test]
fn verification_accepts_generated_codes() {
    let options = RenderOptions {
        verify: true,
        ..large_codes()
    };
    let labels = generate(HIKE.as_bytes(), "hike", &options).expect("verified generate");
    assert_eq!(labels.len(), 3);
}

#[test]
fn alternate_format_and_templates() {
    let options = RenderOptions {
        url_template: "geo:{wp.latitude:.3f},{wp.longitude:.3f}".to_string(),
        title_template: "{gpx_stem} / {wp.name}".to_string(),
        filename_template: "{wp.name}".to_string(),
        image_format: "jpg".to_string(),
        ..RenderOptions::default()
    };
    let labels = generate(HIKE.as_bytes(), "hike", &options).expect("generate");
    assert_eq!(labels[1].url, "geo:45.371,-121.696");
    assert_eq!(labels[1].title, "hike / Summit");

    let archive = convert(HIKE.as_bytes(), "hike", &options).expect("convert");
    assert_eq!(archive.entries(), ["Camp1.jpg", "Summit.jpg", "Lake.jpg"]);

    let mut zip = open_zip(archive.into_bytes());
    let data = read_entry(&mut zip, "Lake.jpg");
    let format = image::guess_format(&data).expect("known image format");
    assert_eq!(format, image::ImageFormat::Jpeg);
}

#[test]
fn output_is_deterministic() {
    let options = RenderOptions::default();
    let first = convert(HIKE.as_bytes(), "hike", &options).expect("first");
    let second = convert(HIKE.as_bytes(), "hike", &options).expect("second");
    assert_eq!(first.entries(), second.entries());

    let a = generate(HIKE.as_bytes(), "hike", &options).expect("generate");
    let b = generate(HIKE.as_bytes(), "hike", &options).expect("generate");
    for (left, right) in a.iter().zip(&b) {
        assert_eq!(left.image, right.image);
    }
}

#[test]
fn file_stem_comes_from_upload_name() {
    let stem = track::file_stem("/uploads/Mt Hood loop.gpx");
    let labels = generate(HIKE.as_bytes(), &stem, &RenderOptions::default()).expect("generate");
    assert_eq!(labels[0].filename, "Mt Hood loop_Camp1.png");
}

#[test]
fn waypoint_names_cannot_add_directories() {
    let archive = convert(SLASHED_NAMES.as_bytes(), "trip", &RenderOptions::default())
        .expect("convert");
    assert_eq!(
        archive.entries(),
        ["trip_a_b.png", "trip_x_.._.._escaped.png", "trip_.._up.png"]
    );

    let zip = open_zip(archive.into_bytes());
    assert!(zip.file_names().all(|name| !name.contains(['/', '\\'])));
}

#[test]
fn previews_stay_inside_their_directory() {
    let root = tempfile::tempdir().expect("tempdir");
    let dir = root.path().join("a").join("previews");
    let labels =
        generate(SLASHED_NAMES.as_bytes(), "trip", &RenderOptions::default()).expect("generate");

    let written =
        write_previews(&labels, &dir, image::ImageFormat::Png).expect("write previews");
    assert_eq!(written.len(), 3);
    for path in &written {
        assert_eq!(path.parent(), Some(dir.as_path()));
        assert!(path.exists());
    }
    assert!(!root.path().join("a").join("escaped.png").exists());
}

#[test]
fn huge_padding_is_a_config_error() {
    let options = RenderOptions {
        title_padding: u32::MAX,
        ..RenderOptions::default()
    };
    let err = generate(HIKE.as_bytes(), "hike", &options).unwrap_err();
    assert!(matches!(err, Error::Config(_)), "unexpected error: {err}");
}
