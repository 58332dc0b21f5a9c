//! End-to-end pipeline tests: load, translate both ways, save.

use std::path::Path;
use ukiyo::convert;
use ukiyo_model::events::NullListener;

const FIVE_LINES: &str = "##sK1 1 2\n\
    document()\n\
    layout('A4',(595.276,841.89),0)\n\
    page('P1','A4',(595.276,841.89),0)\n\
    layer('L1',1,1,0,0,(\"RGB\",0.2,0.3,0.6))\n\
    r(1,0,0,1,10,10)\n";

#[test]
fn convert_reproduces_canonical_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.sk1");
    let output = dir.path().join("out.sk1");
    std::fs::write(&input, FIVE_LINES).unwrap();

    convert(&input, &output, Box::new(NullListener)).unwrap();

    assert_eq!(std::fs::read_to_string(&output).unwrap(), FIVE_LINES);
}

#[test]
fn convert_is_stable_under_iteration() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.sk1");
    let once = dir.path().join("once.sk1");
    let twice = dir.path().join("twice.sk1");

    std::fs::write(
        &input,
        "##sK1 1 2\n\
         document()\n\
         layout('A4',(595.276,841.89),0)\n\
         layer('L1',1,1,0,0,(\"RGB\",0,0,0))\n\
         b()\n\
         bs(0,0,0)\n\
         bc(1,1,2,2,3,3,0)\n\
         bC()\n\
         G()\n\
         e(1,0,0,1,4,4)\n\
         G_()\n",
    )
    .unwrap();

    convert(&input, &once, Box::new(NullListener)).unwrap();
    convert(&once, &twice, Box::new(NullListener)).unwrap();

    assert_eq!(
        std::fs::read_to_string(&once).unwrap(),
        std::fs::read_to_string(&twice).unwrap()
    );
}

#[test]
fn convert_preserves_embedded_bitmaps() {
    use base64::Engine;

    let payload = base64::engine::general_purpose::STANDARD.encode(b"raster bytes");
    let content = format!(
        "##sK1 1 2\n\
         document()\n\
         layout('A4',(595.276,841.89),0)\n\
         layer('L1',1,1,0,0,(\"RGB\",0,0,0))\n\
         bm(7)\n\
         {payload}\n\
         -\n\
         im((1,0,0,1,0,0),7)\n"
    );

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.sk1");
    let output = dir.path().join("out.sk1");
    std::fs::write(&input, &content).unwrap();

    convert(&input, &output, Box::new(NullListener)).unwrap();

    let saved = std::fs::read_to_string(&output).unwrap();
    assert!(saved.contains(&format!("bm(7)\n{payload}\n-\n")));
    assert_eq!(saved.matches("im(").count(), 1);
    assert!(saved.contains("im((1,0,0,1,0,0),7)\n"));
}

#[test]
fn convert_missing_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = convert(
        Path::new("/no/such/input.sk1"),
        &dir.path().join("out.sk1"),
        Box::new(NullListener),
    )
    .unwrap_err();
    assert!(matches!(err, ukiyo::Error::Load(_)));
}
