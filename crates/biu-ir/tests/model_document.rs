//! Loading a TOML model from disk and printing its structural document.

use biu_ir::{network_document, DsMode, Network};

const MODEL: &str = r#"
[defaults]
threshold = 0.6
refractory = 12
ds_bit_width = 4
ds_clock_mhz = 10.0
ds_mode = "FrequencyMode"

[[layers]]
size = 3
probe = "hidden"
synapses = { rows = 3, cols = 2, weights = [[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]] }

[[layers.ranges]]
start = 0
end = 2
leak = 5e8

[[layers]]
size = 1
synapses = { rows = 1, cols = 3, weights = [[0.5, -0.25, 1.0]] }
"#;

#[test]
fn load_from_file_and_print() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.toml");
    std::fs::write(&path, MODEL).unwrap();

    let net = Network::load(&path).expect("load");
    assert_eq!(net.layers.len(), 2);
    assert_eq!(net.layers[0].ranges[0].params.leak, Some(5e8));

    let doc = network_document(&net, DsMode::FrequencyMode).to_document();
    assert!(doc.contains("<DSMode>FrequencyMode</DSMode>"));
    assert!(doc.contains("<DSClockMHz>10</DSClockMHz>"));
    assert!(doc.contains("<DSBitWidth>4</DSBitWidth>"));
    assert!(doc.contains("<row>0.5 -0.25 1</row>"));
    assert!(doc.contains("<NeuronRange start=\"0\" end=\"2\">"));
    assert!(doc.contains("<RLeak>500000000</RLeak>"));
    // probe names are reader-side metadata, never part of the engine's format
    assert!(!doc.contains("hidden"));
}

#[test]
fn printing_is_stable() {
    let net = Network::from_toml_str(MODEL).unwrap();
    let a = network_document(&net, DsMode::ThresholdMode).to_document();
    let b = network_document(&net.clone(), DsMode::ThresholdMode).to_document();
    assert_eq!(a, b);
}
