//! Attaching loaded assets to a host and driving variants.

use std::cell::RefCell;
use std::rc::Rc;

use super::extension_test::variant_glb;
use super::{block_on, triangle_glb};
use crate::compute::CancellationToken;
use crate::configurator::ConfiguratorError;
use crate::host::{HostCall, MemoryHost};
use crate::viewer::{Viewer, ViewerError};

fn loaded_viewer(data: &[u8]) -> Viewer<MemoryHost> {
    let mut viewer = Viewer::new(MemoryHost::new());
    block_on(viewer.load(data, &CancellationToken::new())).unwrap();
    viewer
}

fn material_name(viewer: &Viewer<MemoryHost>, node: &str) -> Option<String> {
    let host = viewer.host();
    let node = host.node(host.find_node(node)?)?;
    let handle = node.primitives.first()?.material?;
    host.material(handle)?.name.clone()
}

#[test]
fn load_attaches_nodes_and_materials() {
    let viewer = loaded_viewer(&triangle_glb(|_| {}));
    let host = viewer.host();

    assert_eq!(host.node_count(), 1);
    assert_eq!(host.material_count(), 1);
    let body = host.node(host.find_node("Body").unwrap()).unwrap();
    assert_eq!(body.primitives.len(), 1);
    assert!(body.enabled);
    assert_eq!(material_name(&viewer, "Body").as_deref(), Some("Red"));
}

#[test]
fn cancelled_load_leaves_host_untouched() {
    let mut viewer = Viewer::new(MemoryHost::new());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = block_on(viewer.load(&triangle_glb(|_| {}), &cancel));
    assert!(matches!(result, Err(ViewerError::Load(_))));
    assert!(viewer.host().calls().is_empty());
    assert!(viewer.asset().is_none());
}

#[test]
fn failed_load_releases_previous_scene() {
    let mut viewer = loaded_viewer(&triangle_glb(|_| {}));
    assert!(!viewer.host().is_empty());

    let result = block_on(viewer.load(b"not a model", &CancellationToken::new()));
    assert!(result.is_err());
    assert!(viewer.host().is_empty());
    assert!(viewer.summary().is_none());
}

#[test]
fn previous_scene_is_released_before_acquire() {
    let mut viewer = loaded_viewer(&triangle_glb(|_| {}));
    viewer.host_mut().clear_calls();

    block_on(viewer.load(&triangle_glb(|_| {}), &CancellationToken::new())).unwrap();

    let calls = viewer.host().calls();
    let first_create = calls
        .iter()
        .position(|c| {
            matches!(
                c,
                HostCall::CreateNode(_) | HostCall::CreateMaterial(_) | HostCall::CreateTexture(_)
            )
        })
        .unwrap();
    let last_destroy = calls
        .iter()
        .rposition(|c| {
            matches!(
                c,
                HostCall::DestroyNode(_) | HostCall::DestroyMaterial(_) | HostCall::DestroyTexture(_)
            )
        })
        .unwrap();
    assert!(last_destroy < first_create);
    assert_eq!(viewer.host().node_count(), 1);
}

#[test]
fn oversized_material_slot_does_not_break_selection() {
    let spoiler = serde_json::json!({"node": 1, "properties": {"materials": [
        {"index": 18446744073709551615u64, "material": 1}
    ]}});
    let mut viewer = loaded_viewer(&variant_glb(Some(spoiler)));

    viewer.select_variant(0, 1).unwrap();
    assert_eq!(material_name(&viewer, "Body").as_deref(), Some("Red"));
    assert_eq!(material_name(&viewer, "Spoiler").as_deref(), Some("Carbon"));
}

#[test]
fn select_variant_updates_host_and_notifies() {
    let mut viewer = loaded_viewer(&variant_glb(None));
    assert_eq!(material_name(&viewer, "Body").as_deref(), Some("White"));

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    viewer
        .configurator_mut()
        .unwrap()
        .on_value_change(0, move |v| sink.borrow_mut().push(v))
        .unwrap();

    viewer.select_variant(0, 1).unwrap();
    assert_eq!(material_name(&viewer, "Body").as_deref(), Some("Red"));
    assert_eq!(viewer.configurator().unwrap().value(0), Some(1));

    viewer.select_variant(0, 1).unwrap();
    assert_eq!(*seen.borrow(), vec![1, 1]);

    viewer.select_variant(1, 1).unwrap();
    let host = viewer.host();
    assert!(!host.node(host.find_node("Spoiler").unwrap()).unwrap().enabled);
}

#[test]
fn select_variant_rejects_bad_selection() {
    let mut viewer = loaded_viewer(&variant_glb(None));

    let err = viewer.select_variant(5, 0).unwrap_err();
    assert!(matches!(
        err,
        ViewerError::Configurator(ConfiguratorError::InvalidField(5))
    ));
    let err = viewer.select_variant(0, 9).unwrap_err();
    assert!(matches!(
        err,
        ViewerError::Configurator(ConfiguratorError::InvalidValue { field: 0, value: 9 })
    ));
    assert_eq!(viewer.configurator().unwrap().value(0), Some(0));
}

#[test]
fn select_variant_requires_a_loaded_asset() {
    let mut viewer = Viewer::new(MemoryHost::new());
    assert!(matches!(
        viewer.select_variant(0, 0),
        Err(ViewerError::NotLoaded)
    ));
    assert!(viewer.configurator().is_none());
}

#[test]
fn replace_host_moves_scene() {
    let mut viewer = loaded_viewer(&variant_glb(None));
    viewer.select_variant(0, 1).unwrap();

    let old = viewer.replace_host(MemoryHost::new());
    assert!(old.is_empty());
    assert_eq!(viewer.host().node_count(), 2);
    assert_eq!(material_name(&viewer, "Body").as_deref(), Some("Red"));
}

#[test]
fn unload_empties_host() {
    let mut viewer = loaded_viewer(&variant_glb(None));
    viewer.unload();
    assert!(viewer.host().is_empty());
    assert!(viewer.asset().is_none());
}
