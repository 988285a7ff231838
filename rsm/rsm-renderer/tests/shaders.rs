//! WGSL sources parse and validate, and expose the entry points the pipelines name.

fn validate(name: &str, source: &str) -> naga::Module {
    let module = naga::front::wgsl::parse_str(source).unwrap_or_else(|e| panic!("{name}: {}", e.emit_to_string(source)));
    naga::valid::Validator::new(naga::valid::ValidationFlags::default(), naga::valid::Capabilities::default())
        .validate(&module)
        .unwrap_or_else(|e| panic!("{name}: {e:?}"));
    module
}

fn entry_points(module: &naga::Module) -> Vec<(&str, naga::ShaderStage)> {
    module.entry_points.iter().map(|ep| (ep.name.as_str(), ep.stage)).collect()
}

#[test]
fn scene_shader_is_valid() {
    let module = validate("scene.wgsl", include_str!("../shaders/scene.wgsl"));
    let eps = entry_points(&module);
    assert!(eps.contains(&("vs", naga::ShaderStage::Vertex)));
    assert!(eps.contains(&("fs_rsm", naga::ShaderStage::Fragment)));
    assert!(eps.contains(&("fs_gbuffer", naga::ShaderStage::Fragment)));
}

#[test]
fn lighting_shader_is_valid() {
    let module = validate("lighting.wgsl", include_str!("../shaders/lighting.wgsl"));
    let eps = entry_points(&module);
    assert!(eps.contains(&("vs_fullscreen", naga::ShaderStage::Vertex)));
    assert!(eps.contains(&("fs_direct", naga::ShaderStage::Fragment)));
    assert!(eps.contains(&("fs_indirect", naga::ShaderStage::Fragment)));
}

#[test]
fn present_shader_is_valid() {
    let module = validate("present.wgsl", include_str!("../shaders/present.wgsl"));
    let eps = entry_points(&module);
    assert!(eps.contains(&("vs", naga::ShaderStage::Vertex)));
    assert!(eps.contains(&("fs", naga::ShaderStage::Fragment)));
}

#[test]
fn lighting_uniform_size_matches_rust_mirror() {
    let module = validate("lighting.wgsl", include_str!("../shaders/lighting.wgsl"));
    let lighting = module
        .types
        .iter()
        .find(|(_, ty)| ty.name.as_deref() == Some("Lighting"))
        .map(|(_, ty)| ty)
        .expect("Lighting struct");
    match &lighting.inner {
        naga::TypeInner::Struct { span, .. } => {
            assert_eq!(*span as usize, std::mem::size_of::<rsm_renderer::LightingUniform>());
        }
        other => panic!("unexpected type {other:?}"),
    }
}
