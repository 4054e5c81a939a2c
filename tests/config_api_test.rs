//! Integration tests for config module public API.

use std::fs;
use std::path::Path;

use hangar::config::{
    deep_merge, load_config, parse_layer, upgrade_config, ConfigSources, LayerKind, LegacyConfig,
    LoadedConfig, MachineConfig, NetworkKind, VersionedDocument, CURRENT_VERSION,
    DEFAULT_MACHINE_NAME, LEGACY_VERSION,
};
use hangar::HangarError;
use tempfile::TempDir;

const LEGACY: &str = r#"
version: 1
vm:
  box: precise64
  host_name: legacy.local
  boot_mode: gui
  forward_ports:
    - { name: web, guest: 80, host: 8080 }
  shared_folders:
    v-root: { host_path: ., guest_path: /vagrant }
  customize:
    - [modifyvm, ":id", --memory, "512"]
  define:
    - name: web
      primary: true
      config:
        vm:
          host_name: web.local
ssh:
  max_tries: 10
  timeout: 60
"#;

#[test]
fn public_api_is_accessible() {
    let _config = MachineConfig::default();
    assert_eq!(CURRENT_VERSION, 2);
    assert_eq!(LEGACY_VERSION, 1);
    assert_eq!(DEFAULT_MACHINE_NAME, "default");
}

#[test]
fn legacy_source_parses_as_v1() {
    let layer = parse_layer(LEGACY, Path::new("Hangarfile"), LayerKind::Project).unwrap();
    assert!(matches!(layer.document, VersionedDocument::V1(_)));
}

#[test]
fn legacy_upgrade_maps_fields() {
    let legacy: LegacyConfig = serde_yaml::from_str(
        &LEGACY.replace("version: 1\n", ""),
    )
    .unwrap();

    let (config, machines) = upgrade_config(legacy);

    assert_eq!(config.vm.box_name.as_deref(), Some("precise64"));
    assert_eq!(config.vm.hostname.as_deref(), Some("legacy.local"));
    assert_eq!(config.vm.gui, Some(true));
    assert_eq!(config.ssh.connect_retries, Some(10));
    assert_eq!(config.ssh.connect_timeout, Some(60));

    let networks = config.vm.networks.unwrap();
    assert_eq!(networks[0].kind, NetworkKind::ForwardedPort);
    assert_eq!(networks[0].id.as_deref(), Some("web"));
    assert_eq!(networks[0].host, Some(8080));

    let folders = config.vm.synced_folders.unwrap();
    assert_eq!(folders[0].id.as_deref(), Some("v-root"));
    assert_eq!(folders[0].guest, "/vagrant");

    assert_eq!(
        config.providers["virtualbox"]["customize"][0][2],
        "--memory"
    );

    assert_eq!(machines.len(), 1);
    assert_eq!(machines[0].name, "web");
    assert!(machines[0].primary);
    assert_eq!(machines[0].config["vm"]["hostname"], "web.local");
}

#[test]
fn legacy_project_defines_machines() {
    let layer = parse_layer(LEGACY, Path::new("Hangarfile"), LayerKind::Project).unwrap();
    let loaded = LoadedConfig::from_layers(vec![layer]).unwrap();

    assert_eq!(loaded.machine_names(), ["web"]);
    let web = loaded.machine_config("web", None).unwrap();
    assert_eq!(web.vm.hostname.as_deref(), Some("web.local"));
    assert_eq!(web.vm.box_name.as_deref(), Some("precise64"));
}

#[test]
fn legacy_nested_define_is_invalid() {
    let source = r#"
version: 1
vm:
  define:
    - name: outer
      config:
        vm:
          define:
            - name: inner
"#;
    let result = parse_layer(source, Path::new("Hangarfile"), LayerKind::Project);
    match result {
        Err(HangarError::ConfigInvalid { path, message }) => {
            assert_eq!(path, Path::new("Hangarfile"));
            assert!(message.contains("vm.define"));
        }
        other => panic!("expected ConfigInvalid, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn deep_merge_semantics() {
    let base: serde_yaml::Value =
        serde_yaml::from_str("vm: { box: a, networks: [1, 2] }\nssh: { port: 22 }\n").unwrap();
    let overlay: serde_yaml::Value =
        serde_yaml::from_str("vm: { networks: [3] }\nssh: { port: null }\n").unwrap();

    let merged = deep_merge(&base, &overlay);

    assert_eq!(merged["vm"]["box"], "a");
    assert_eq!(merged["vm"]["networks"].as_sequence().unwrap().len(), 1);
    assert!(merged["ssh"].get("port").is_none());
}

#[test]
fn null_removes_inherited_key() {
    let project = TempDir::new().unwrap();
    let home = TempDir::new().unwrap();
    fs::write(home.path().join("Hangarfile"), "vm:\n  box: home-box\n").unwrap();
    fs::write(project.path().join("Hangarfile"), "vm:\n  box: null\n").unwrap();

    let sources = ConfigSources::discover(home.path(), Some(project.path()), "Hangarfile");
    let loaded = load_config(&sources).unwrap();

    assert_eq!(loaded.global().vm.box_name, None);
}

#[test]
fn invalid_project_source_names_its_path() {
    let project = TempDir::new().unwrap();
    let home = TempDir::new().unwrap();
    let path = project.path().join("Hangarfile");
    fs::write(&path, "ssh:\n  prot: 22\n").unwrap();

    let sources = ConfigSources::discover(home.path(), Some(project.path()), "Hangarfile");
    match load_config(&sources) {
        Err(HangarError::ConfigInvalid { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected ConfigInvalid, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn machines_in_home_source_are_rejected() {
    let home = TempDir::new().unwrap();
    fs::write(home.path().join("Hangarfile"), "machines:\n  - name: web\n").unwrap();

    let sources = ConfigSources::discover(home.path(), None, "Hangarfile");
    assert!(matches!(
        load_config(&sources),
        Err(HangarError::ConfigInvalid { .. })
    ));
}
