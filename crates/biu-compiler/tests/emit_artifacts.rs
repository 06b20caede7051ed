//! Artifact emission end to end

use std::path::Path;

use biu_compiler::{compile, CompiledArtifact, EmitOptions, NETWORK_FILE, STIMULUS_FILE, SUPERVISOR_FILE};
use biu_ir::{Layer, Network, NetworkDefaults, NeuronParams, RunConfig, SynapseMatrix, PROBE_INDEX_FILE, RUN_CONFIG_FILE};
use biu_storage::{Availability, Signal};

fn network() -> Network {
    Network::new(NetworkDefaults {
        threshold: Some(0.9),
        leak: Some(1e9),
        refractory: Some(14),
        ds_bit_width: Some(8),
        ds_clock_mhz: Some(50.0),
        ..NetworkDefaults::default()
    })
    .with_layer(Layer::new(2, SynapseMatrix::from_rows(vec![vec![1.0, 0.5], vec![0.25, 1.0]])).with_probe("input"))
    .with_layer(
        Layer::new(3, SynapseMatrix::from_rows(vec![vec![0.1, 0.2]; 3]))
            .with_range(0, 2, NeuronParams::threshold(0.2))
            .with_neuron(1, NeuronParams::threshold(0.19).with_refractory(3))
            .with_probe("output"),
    )
}

fn read_all(dir: &Path) -> Vec<(String, String)> {
    let mut files: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.is_file())
        .map(|p| (p.file_name().unwrap().to_string_lossy().into_owned(), std::fs::read_to_string(&p).unwrap()))
        .collect();
    files.sort();
    files
}

#[test]
fn compiling_twice_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let opts = EmitOptions::default()
        .with_inline_input(vec![vec![1.0, 0.0], vec![0.0, 1.0]])
        .with_supervisor();

    compile(&network(), dir.path(), &opts).unwrap();
    let first = read_all(dir.path());
    compile(&network(), dir.path(), &opts).unwrap();
    assert_eq!(first, read_all(dir.path()));

    let names: Vec<_> = first.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec![NETWORK_FILE, RUN_CONFIG_FILE, STIMULUS_FILE, PROBE_INDEX_FILE, SUPERVISOR_FILE]);
}

#[test]
fn run_config_paths_are_absolute() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("stim.txt");
    std::fs::write(&input, "1 0\n").unwrap();
    let opts = EmitOptions::default()
        .with_input_file(&input)
        .with_energy_tables(Some(dir.path().join("syn.csv")), None);

    let artifact = compile(&network(), &dir.path().join("out"), &opts).unwrap();
    let cfg = RunConfig::load(artifact.config_path()).unwrap();
    assert!(cfg.output_directory.is_absolute() && cfg.output_directory.is_dir());
    assert!(cfg.xml_config_path.is_absolute());
    assert_eq!(cfg.data_input_file, input);
    assert!(cfg.sup_xml_config_path.is_none());
    assert!(cfg.synapses_energy_table_path.unwrap().is_absolute());
    assert!(cfg.neuron_energy_table_path.is_none());
}

#[test]
fn probe_index_only_when_probes_exist() {
    let dir = tempfile::tempdir().unwrap();
    let opts = EmitOptions::default().with_inline_input(vec![vec![0.0, 0.0]]);
    compile(&network(), dir.path(), &opts).unwrap();
    assert!(dir.path().join(PROBE_INDEX_FILE).exists());

    let mut bare = network();
    for l in &mut bare.layers {
        l.probe = None;
    }
    let artifact = compile(&bare, dir.path(), &opts).unwrap();
    assert!(!dir.path().join(PROBE_INDEX_FILE).exists());
    assert!(artifact.list_probes().is_empty());
}

#[test]
fn recompiling_drops_files_the_new_options_do_not_produce() {
    let dir = tempfile::tempdir().unwrap();
    let full = EmitOptions::default()
        .with_inline_input(vec![vec![1.0, 0.0]])
        .with_supervisor();
    compile(&network(), dir.path(), &full).unwrap();
    assert!(dir.path().join(SUPERVISOR_FILE).exists());
    assert!(dir.path().join(STIMULUS_FILE).exists());

    let stim = dir.path().join("stim.txt");
    std::fs::write(&stim, "0 1\n").unwrap();
    compile(&network(), dir.path(), &EmitOptions::default().with_input_file(&stim)).unwrap();
    assert!(!dir.path().join(SUPERVISOR_FILE).exists());
    assert!(!dir.path().join(STIMULUS_FILE).exists());

    // an input file living at the artifact's own input.txt survives
    let own = dir.path().join(STIMULUS_FILE);
    std::fs::write(&own, "1 1\n").unwrap();
    let artifact = compile(&network(), dir.path(), &EmitOptions::default().with_input_file(&own)).unwrap();
    assert_eq!(std::fs::read_to_string(&own).unwrap(), "1 1\n");
    assert_eq!(artifact.run_config().data_input_file, own);
}

#[test]
fn reopened_artifact_serves_probes_and_energy() {
    let dir = tempfile::tempdir().unwrap();
    let syn = dir.path().join("syn.csv");
    std::fs::write(&syn, "w,in,out\nw0,2.0,0.5\n").unwrap();
    let opts = EmitOptions::default()
        .with_inline_input(vec![vec![1.0, 1.0]])
        .with_energy_tables(Some(syn), Some(dir.path().join("missing.csv")));
    let compiled = compile(&network(), &dir.path().join("art"), &opts).unwrap();
    assert_eq!(compiled.resolved().unwrap()[1].neuron(1).unwrap().refractory, Some(3));

    let artifact = CompiledArtifact::open(compiled.config_path()).unwrap();
    assert!(artifact.resolved().is_none());
    assert_eq!(artifact.list_probes(), vec!["input", "output"]);
    assert_eq!(artifact.probe_metadata("output").unwrap().layer_size, 3);

    let probe = artifact.get_probe("output").unwrap();
    assert!(matches!(probe.spikes(0).unwrap(), Availability::NotYetAvailable(_)));
    std::fs::write(artifact.output_dir().join("spikes_1_0.txt"), "0\n1\n").unwrap();
    assert_eq!(probe.read::<i64>(Signal::Spikes, 0).unwrap().ready().unwrap(), vec![0, 1]);
    assert!(artifact.get_probe("hidden").is_err());

    assert_eq!(artifact.energy().synapse().query(0.3, true), 2.0);
    assert_eq!(artifact.energy().neuron().query(0.5, 0.5), 0.0);
}
