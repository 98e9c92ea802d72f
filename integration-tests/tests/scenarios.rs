use std::{collections::HashSet, fs};

use serde_json::Value;
use trellis_scenarios::{ConfigError, ScenarioConfig, ScenarioError, Variant};

const VARIANTS: [Variant; 3] = [Variant::Monolithic, Variant::Single, Variant::Separate];

#[test]
fn every_variant_assembles_with_defaults() {
    let config = ScenarioConfig::default();

    for variant in VARIANTS {
        let topology = variant.assemble(&config).unwrap();

        assert!(!topology.edges().is_empty(), "{variant}");
        assert_eq!(topology.call_order().len(), topology.nodes().len(), "{variant}");
        assert_eq!(topology.delayed_edges().count(), 1, "{variant}");
        assert_eq!(topology.warnings().len(), 11, "{variant} repeats P_from per line");
    }
}

#[test]
fn hand_off_document_is_self_contained() {
    let topology = Variant::Separate.assemble(&ScenarioConfig::default()).unwrap();
    let document: Value = serde_json::to_value(&topology).unwrap();

    let ids: HashSet<_> = document["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|node| node["id"].as_str().unwrap())
        .collect();
    for edge in document["edges"].as_array().unwrap() {
        assert!(ids.contains(edge["source"]["node"].as_str().unwrap()));
        assert!(ids.contains(edge["destination"]["node"].as_str().unwrap()));

        let shifted = edge["delay"] == "ONE_STEP_SHIFTED";
        assert_eq!(shifted, edge.get("seed").is_some(), "{edge}");
    }

    let vis = &document["styles"]["Topology_0"];
    assert_eq!(vis["etypes"]["House"]["cls"], "load");
    assert_eq!(vis["etypes"]["PQBus"]["attr"], "Vm");
    let hidden: Vec<_> = vis["ignore_types"].as_array().unwrap().iter().collect();
    assert_eq!(hidden, vec!["Database", "Grid", "ResidentialLoads", "Topology"]);
}

#[test]
fn configuration_is_read_from_toml() {
    let dir = std::env::temp_dir().join("trellis-integration-config");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("scenario.toml");
    fs::write(&path, "seed = 5\npv_count = 4\ngrid_node = \"node_c2\"\n").unwrap();

    let config = ScenarioConfig::from_toml_file(&path).unwrap();
    assert_eq!(config.seed, 5);
    assert_eq!(config.pv_count, 4);

    let topology = Variant::Single.assemble(&config).unwrap();
    let delayed = topology.delayed_edges().next().unwrap();
    assert_eq!(delayed.source.node.as_str(), "0-node_c2");

    let topology = Variant::Separate.assemble(&config).unwrap();
    let pvs = topology
        .nodes()
        .iter()
        .filter(|node| node.id().as_str().starts_with("PV_"))
        .count();
    assert_eq!(pvs, 4);
}

#[test]
fn config_errors_convert_into_scenario_errors() {
    let error: ScenarioError = ScenarioConfig::from_toml_str("seed = \"many\"")
        .map_err(ScenarioError::from)
        .unwrap_err();

    assert!(matches!(error, ScenarioError::Config(ConfigError::Parse(_))));
}
