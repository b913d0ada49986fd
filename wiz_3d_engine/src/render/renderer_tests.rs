/// Unit tests for renderer.rs

use super::*;
use crate::camera::{Camera, Transform};
use crate::device::mock_device::{mock_device_chain, MockCommand, SharedMockState};
use crate::device::{ClearFlags, IndexFormat};
use crate::resource::StandardVertex;
use glam::{Vec2, Vec3};

const BASIC: &str = include_str!("../../shaders/basic.hlsl");

fn renderer(width: u32, height: u32) -> (Renderer, SharedMockState) {
    let (chain, state) = mock_device_chain(width, height, 2);
    let renderer = Renderer::new(chain, RendererConfig::default()).unwrap();
    (renderer, state)
}

fn renderer_with_program() -> (Renderer, SharedMockState) {
    let (mut renderer, state) = renderer(800, 600);
    let program = ShaderProgram::load(renderer.device(), "Basic", BASIC).unwrap();
    renderer.set_program(Arc::new(program));
    state.lock().unwrap().commands.clear();
    (renderer, state)
}

fn triangle(renderer: &Renderer, name: &str) -> Arc<Mesh> {
    let n = Vec3::Z;
    let vertices = [
        StandardVertex::new(Vec3::new(0.0, 1.0, 0.0), n, Vec2::new(0.5, 0.0)),
        StandardVertex::new(Vec3::new(1.0, -1.0, 0.0), n, Vec2::new(1.0, 1.0)),
        StandardVertex::new(Vec3::new(-1.0, -1.0, 0.0), n, Vec2::new(0.0, 1.0)),
    ];
    let mesh = Mesh::from_arrays(renderer.device(), name, &vertices, &[0, 1, 2], &[]).unwrap();
    Arc::new(mesh)
}

fn matrix_bytes(m: Mat4) -> Vec<u8> {
    bytemuck::bytes_of(&m).to_vec()
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

#[test]
fn test_new_prepares_pipeline() {
    let (renderer, state) = renderer(800, 600);

    let state = state.lock().unwrap();
    assert_eq!(
        state.commands,
        vec![
            MockCommand::SetPrimitiveTopology(PrimitiveTopology::TriangleList),
            MockCommand::SetSampler { stage: ShaderStage::Pixel, slot: 0 },
            MockCommand::SetViewport(Viewport::from_size(800, 600)),
            MockCommand::SetRenderTargets { width: 800, height: 600, back_buffer_index: 0 },
        ]
    );
    assert_eq!(state.samplers_created, 1);
    assert_eq!(state.depth_targets_created, vec![(800, 600)]);
    assert_eq!(renderer.back_buffer_counter().live(), 1);
    assert_eq!(renderer.stats(), RendererStats::default());
    assert!(renderer.program().is_none());
}

#[test]
fn test_new_uses_configured_topology() {
    let (chain, state) = mock_device_chain(64, 64, 2);
    let config = RendererConfig {
        topology: PrimitiveTopology::LineList,
        ..RendererConfig::default()
    };
    let _renderer = Renderer::new(chain, config).unwrap();

    assert_eq!(
        state.lock().unwrap().commands[0],
        MockCommand::SetPrimitiveTopology(PrimitiveTopology::LineList)
    );
}

#[test]
fn test_new_without_back_buffers_fails() {
    let (chain, _state) = mock_device_chain(64, 64, 0);
    let result = Renderer::new(chain, RendererConfig::default());
    assert!(matches!(result, Err(Error::InitializationFailed(_))));
}

// ============================================================================
// RESIZE
// ============================================================================

#[test]
fn test_resize_reallocates_and_rebinds() {
    let (mut renderer, state) = renderer(800, 600);
    state.lock().unwrap().commands.clear();

    renderer.notify_resize(ResizeEvent::new(1024, 768));
    renderer.begin_frame().unwrap();

    let state = state.lock().unwrap();
    assert_eq!(state.swapchain_resizes, vec![(1024, 768)]);
    assert_eq!(state.depth_targets_created, vec![(800, 600), (1024, 768)]);
    assert_eq!(
        state.commands,
        vec![
            MockCommand::SetViewport(Viewport::from_size(1024, 768)),
            MockCommand::SetRenderTargets { width: 1024, height: 768, back_buffer_index: 0 },
        ]
    );
    drop(state);

    let frame_buffer = renderer.frame_buffer().unwrap();
    assert_eq!((frame_buffer.width(), frame_buffer.height()), (1024, 768));
    assert_eq!(renderer.back_buffer_counter().live(), 1);
}

#[test]
fn test_resize_to_current_size_is_noop() {
    let (mut renderer, state) = renderer(800, 600);
    state.lock().unwrap().commands.clear();

    renderer.notify_resize(ResizeEvent::new(800, 600));
    renderer.begin_frame().unwrap();

    let state = state.lock().unwrap();
    assert!(state.swapchain_resizes.is_empty());
    assert!(state.commands.is_empty());
}

#[test]
fn test_zero_sized_resize_is_dropped() {
    let (mut renderer, state) = renderer(800, 600);

    renderer.notify_resize(ResizeEvent::new(0, 600));
    renderer.begin_frame().unwrap();
    assert!(state.lock().unwrap().swapchain_resizes.is_empty());

    // Not retried on the next frame either
    renderer.begin_frame().unwrap();
    assert!(state.lock().unwrap().swapchain_resizes.is_empty());
    assert_eq!(renderer.frame_buffer().unwrap().width(), 800);
}

#[test]
fn test_failed_resize_is_retried_next_frame() {
    let (mut renderer, state) = renderer(800, 600);

    // A live back-buffer view makes the swapchain refuse to resize
    let view = renderer.swapchain().back_buffer_target(1).unwrap();
    renderer.notify_resize(ResizeEvent::new(1024, 768));
    assert!(matches!(renderer.begin_frame(), Err(Error::BackendError(_))));
    assert!(renderer.resize_notifier().is_pending());
    assert!(state.lock().unwrap().swapchain_resizes.is_empty());

    drop(view);
    renderer.begin_frame().unwrap();

    assert_eq!(state.lock().unwrap().swapchain_resizes, vec![(1024, 768)]);
    let frame_buffer = renderer.frame_buffer().unwrap();
    assert!(frame_buffer.has_targets());
    assert_eq!((frame_buffer.width(), frame_buffer.height()), (1024, 768));
    renderer.clear([0.0, 0.0, 0.0, 1.0]).unwrap();
}

#[test]
fn test_failed_resize_recovers_after_zero_sized_event() {
    let (mut renderer, state) = renderer(800, 600);

    let view = renderer.swapchain().back_buffer_target(1).unwrap();
    renderer.notify_resize(ResizeEvent::new(1024, 768));
    assert!(renderer.begin_frame().is_err());

    // Window minimised before the retry: the newer event replaces the failed one
    renderer.notify_resize(ResizeEvent::new(0, 0));
    drop(view);
    renderer.begin_frame().unwrap();

    assert_eq!(state.lock().unwrap().swapchain_resizes, vec![(800, 600)]);
    assert!(renderer.frame_buffer().unwrap().has_targets());
    assert!(!renderer.resize_notifier().is_pending());
    renderer.clear([0.0, 0.0, 0.0, 1.0]).unwrap();
}

#[test]
fn test_latest_resize_wins() {
    let (mut renderer, state) = renderer(800, 600);
    let notifier = renderer.resize_notifier();

    notifier.notify(ResizeEvent::new(640, 480));
    notifier.notify(winit::dpi::PhysicalSize::new(1280u32, 720u32));
    renderer.begin_frame().unwrap();

    assert_eq!(state.lock().unwrap().swapchain_resizes, vec![(1280, 720)]);
    assert!(!notifier.is_pending());
}

#[test]
fn test_resize_from_another_thread() {
    let (mut renderer, state) = renderer(800, 600);
    let notifier = renderer.resize_notifier();

    std::thread::spawn(move || notifier.notify(ResizeEvent::new(320, 240)))
        .join()
        .unwrap();
    renderer.begin_frame().unwrap();

    assert_eq!(state.lock().unwrap().swapchain_resizes, vec![(320, 240)]);
}

// ============================================================================
// FRAME SEQUENCE
// ============================================================================

#[test]
fn test_clear_clears_color_depth_and_stencil() {
    let (mut renderer, state) = renderer(800, 600);
    state.lock().unwrap().commands.clear();

    renderer.clear([0.1, 0.2, 0.3, 1.0]).unwrap();

    assert_eq!(
        state.lock().unwrap().commands,
        vec![
            MockCommand::ClearRenderTarget { color: [0.1, 0.2, 0.3, 1.0] },
            MockCommand::ClearDepthStencil {
                flags: ClearFlags::DEPTH | ClearFlags::STENCIL,
                depth: 1.0,
                stencil: 0,
            },
        ]
    );
}

#[test]
fn test_begin_draw_binds_program_and_uploads_camera() {
    let (mut renderer, state) = renderer_with_program();
    let mut camera = Camera::with_aspect(60.0, 800.0 / 600.0);
    camera.look_at_lh(Vec3::new(0.0, 0.0, -5.0), Vec3::ZERO, Vec3::Y);

    renderer.begin_draw(&camera).unwrap();
    assert!(renderer.is_drawing());

    let state = state.lock().unwrap();
    assert!(state.commands.contains(&MockCommand::SetShader(ShaderStage::Vertex)));
    assert!(state.commands.contains(&MockCommand::SetShader(ShaderStage::Pixel)));
    assert_eq!(
        state.uploads_to("CameraData"),
        vec![matrix_bytes(camera.view_projection().transpose())]
    );
}

#[test]
fn test_end_draw_draws_in_submission_order() {
    let (mut renderer, state) = renderer_with_program();
    let first = triangle(&renderer, "first");
    let second = triangle(&renderer, "second");
    let a = Transform::from_position(Vec3::new(1.0, 0.0, 0.0)).matrix();
    let b = Transform::from_position(Vec3::new(0.0, 2.0, 0.0)).matrix();

    renderer.begin_draw(&Camera::with_aspect(60.0, 1.0)).unwrap();
    renderer.submit(&first, a).unwrap();
    renderer.submit(&second, b).unwrap();
    renderer.end_draw().unwrap();

    let state = state.lock().unwrap();
    assert_eq!(
        state.uploads_to("ObjectData"),
        vec![matrix_bytes(a.transpose()), matrix_bytes(b.transpose())]
    );

    // Each object upload precedes the draw of its own mesh
    let order: Vec<String> = state
        .commands
        .iter()
        .filter_map(|c| match c {
            MockCommand::UpdateBuffer { label, .. } if label == "ObjectData" => Some("upload".to_string()),
            MockCommand::SetVertexBuffer { label, .. } => Some(label.clone()),
            MockCommand::DrawIndexed { .. } => Some("draw".to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(
        order,
        vec!["upload", "first.vertices", "draw", "upload", "second.vertices", "draw"]
    );
    assert!(state.commands.contains(&MockCommand::SetIndexBuffer {
        label: "second.indices".to_string(),
        format: IndexFormat::R32_UINT,
        offset: 0,
    }));
}

#[test]
fn test_end_draw_presents_with_sync_interval() {
    let (chain, state) = mock_device_chain(800, 600, 2);
    let config = RendererConfig {
        sync_interval: 0,
        ..RendererConfig::default()
    };
    let mut renderer = Renderer::new(chain, config).unwrap();
    let program = ShaderProgram::load(renderer.device(), "Basic", BASIC).unwrap();
    renderer.set_program(Arc::new(program));

    renderer.begin_draw(&Camera::with_aspect(60.0, 1.0)).unwrap();
    renderer.end_draw().unwrap();
    renderer.begin_draw(&Camera::with_aspect(60.0, 1.0)).unwrap();
    renderer.end_draw().unwrap();

    assert_eq!(state.lock().unwrap().presents, vec![0, 0]);
}

#[test]
fn test_empty_frame_presents_without_drawing() {
    let (mut renderer, state) = renderer_with_program();

    renderer.begin_draw(&Camera::with_aspect(60.0, 1.0)).unwrap();
    renderer.end_draw().unwrap();

    let state = state.lock().unwrap();
    assert_eq!(state.draw_count(), 0);
    assert_eq!(state.presents, vec![1]);
}

#[test]
fn test_submitted_transform_is_a_snapshot() {
    let (mut renderer, state) = renderer_with_program();
    let mesh = triangle(&renderer, "tri");
    let mut transform = Transform::from_position(Vec3::new(3.0, 0.0, 0.0));

    renderer.begin_draw(&Camera::with_aspect(60.0, 1.0)).unwrap();
    renderer.submit(&mesh, transform.matrix()).unwrap();
    let submitted = transform.matrix();
    transform.position = Vec3::new(-3.0, 0.0, 0.0);
    renderer.end_draw().unwrap();

    assert_eq!(
        state.lock().unwrap().uploads_to("ObjectData"),
        vec![matrix_bytes(submitted.transpose())]
    );
}

#[test]
fn test_failed_draw_still_empties_queue() {
    let (mut renderer, state) = renderer_with_program();
    let mesh = triangle(&renderer, "tri");

    renderer.begin_draw(&Camera::with_aspect(60.0, 1.0)).unwrap();
    renderer.submit(&mesh, Mat4::IDENTITY).unwrap();
    renderer.submit(&mesh, Mat4::IDENTITY).unwrap();
    state.lock().unwrap().fail_draw = true;
    assert!(renderer.end_draw().is_err());
    assert!(!renderer.is_drawing());
    assert!(state.lock().unwrap().presents.is_empty());

    // Next frame starts from an empty queue
    state.lock().unwrap().fail_draw = false;
    state.lock().unwrap().commands.clear();
    renderer.begin_draw(&Camera::with_aspect(60.0, 1.0)).unwrap();
    renderer.end_draw().unwrap();

    let state = state.lock().unwrap();
    assert_eq!(state.draw_count(), 0);
    assert_eq!(state.presents, vec![1]);
}

#[test]
fn test_stats_follow_presented_frames() {
    let (mut renderer, _state) = renderer_with_program();
    let mesh = triangle(&renderer, "tri");

    renderer.begin_draw(&Camera::with_aspect(60.0, 1.0)).unwrap();
    renderer.submit(&mesh, Mat4::IDENTITY).unwrap();
    renderer.submit(&mesh, Mat4::IDENTITY).unwrap();
    renderer.end_draw().unwrap();

    assert_eq!(
        renderer.stats(),
        RendererStats { frame_index: 1, draw_calls: 2, triangles: 2, submitted: 2 }
    );

    renderer.begin_draw(&Camera::with_aspect(60.0, 1.0)).unwrap();
    renderer.end_draw().unwrap();
    assert_eq!(
        renderer.stats(),
        RendererStats { frame_index: 2, draw_calls: 0, triangles: 0, submitted: 0 }
    );
}

// ============================================================================
// SEQUENCING ERRORS
// ============================================================================

#[test]
fn test_begin_draw_without_program_fails() {
    let (mut renderer, _state) = renderer(800, 600);
    let result = renderer.begin_draw(&Camera::with_aspect(60.0, 1.0));
    assert!(matches!(result, Err(Error::InvalidResource(_))));
    assert!(!renderer.is_drawing());
}

#[test]
fn test_nested_begin_draw_fails() {
    let (mut renderer, _state) = renderer_with_program();
    let camera = Camera::with_aspect(60.0, 1.0);
    renderer.begin_draw(&camera).unwrap();
    assert!(matches!(renderer.begin_draw(&camera), Err(Error::InvalidResource(_))));
    assert!(matches!(renderer.begin_frame(), Err(Error::InvalidResource(_))));
}

#[test]
fn test_submit_and_end_draw_outside_draw_fail() {
    let (mut renderer, state) = renderer_with_program();
    let mesh = triangle(&renderer, "tri");

    assert!(matches!(renderer.submit(&mesh, Mat4::IDENTITY), Err(Error::InvalidResource(_))));
    assert!(matches!(renderer.end_draw(), Err(Error::InvalidResource(_))));
    assert!(state.lock().unwrap().presents.is_empty());
}

// ============================================================================
// SHUTDOWN
// ============================================================================

#[test]
fn test_shutdown_releases_frame_buffer_then_flushes() {
    let (mut renderer, state) = renderer_with_program();

    renderer.shutdown().unwrap();

    assert!(renderer.frame_buffer().is_none());
    assert!(renderer.program().is_none());
    assert_eq!(renderer.back_buffer_counter().live(), 0);
    assert_eq!(
        state.lock().unwrap().commands,
        vec![MockCommand::ClearState, MockCommand::Flush]
    );

    // Second call does nothing
    renderer.shutdown().unwrap();
    assert_eq!(state.lock().unwrap().commands.len(), 2);
}

#[test]
fn test_drop_shuts_down() {
    let (renderer, state) = renderer_with_program();
    let counter = renderer.back_buffer_counter().clone();

    drop(renderer);

    assert_eq!(counter.live(), 0);
    assert_eq!(
        state.lock().unwrap().commands,
        vec![MockCommand::ClearState, MockCommand::Flush]
    );
}

#[test]
fn test_frame_after_shutdown_fails() {
    let (mut renderer, _state) = renderer_with_program();
    renderer.shutdown().unwrap();

    assert!(matches!(renderer.clear([0.0; 4]), Err(Error::InvalidResource(_))));
    assert!(matches!(
        renderer.begin_draw(&Camera::with_aspect(60.0, 1.0)),
        Err(Error::InvalidResource(_))
    ));
}
