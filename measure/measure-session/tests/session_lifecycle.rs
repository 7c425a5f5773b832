//! End-to-end lifecycle tests on rendered depth of a synthetic box.

use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use approx::assert_relative_eq;
use measure_edit::Gesture;
use measure_session::{
    MeasurementSession, MeasurementState, MergeOutcome, SessionConfig, SessionError, SessionEvent,
};
use measure_types::{MeasurementId, OrientedBox};
use nalgebra::{Point3, Vector2, Vector3};
use sensor_types::{
    Camera, CameraIntrinsics, CameraPose, DepthFrame, Observation, SegmentationMask, Selection,
};

const WIDTH: u32 = 320;
const HEIGHT: u32 = 240;

/// 0.4 × 0.3 × 0.2 m box standing on the floor, turned 0.4 rad.
fn truth() -> OrientedBox {
    OrientedBox::from_yaw(
        Point3::new(0.0, 0.15, 0.0),
        Vector3::new(0.2, 0.15, 0.1),
        0.4,
    )
}

/// Distance along `dir` from `origin` to the first surface of `obb`.
fn ray_box(obb: &OrientedBox, origin: &Point3<f64>, dir: &Vector3<f64>) -> Option<f64> {
    let o = obb.world_to_local(origin);
    let d = obb.world_to_local(&(origin + dir)) - o;
    let h = obb.half_extents();
    let (mut t_near, mut t_far) = (0.0_f64, f64::INFINITY);
    for i in 0..3 {
        if d[i].abs() < 1e-12 {
            if o[i].abs() > h[i] {
                return None;
            }
            continue;
        }
        let a = (-h[i] - o[i]) / d[i];
        let b = (h[i] - o[i]) / d[i];
        t_near = t_near.max(a.min(b));
        t_far = t_far.min(a.max(b));
    }
    (t_near <= t_far).then_some(t_near)
}

/// Depth of `obb` as seen from `eye`, with the box pixels selected.
#[allow(clippy::cast_possible_truncation)]
fn render(obb: &OrientedBox, eye: Point3<f64>) -> Observation {
    let pose = CameraPose::look_at(eye, Point3::new(0.0, 0.1, 0.0), Vector3::y()).unwrap();
    let camera = Camera::new(CameraIntrinsics::ideal(240.0, WIDTH, HEIGHT), pose);

    let mut depths = vec![0.0_f32; (WIDTH * HEIGHT) as usize];
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let ray = camera.pixel_ray(f64::from(x), f64::from(y));
            if let Some(t) = ray_box(obb, &eye, &ray) {
                depths[(y * WIDTH + x) as usize] = t as f32;
            }
        }
    }

    let hit: Vec<bool> = depths.iter().map(|&d| d > 0.0).collect();
    let mask = SegmentationMask::from_fn(WIDTH, HEIGHT, |x, y| hit[(y * WIDTH + x) as usize]);
    let depth = DepthFrame::try_new(WIDTH, HEIGHT, depths, None).unwrap();
    Observation::new(depth, camera).with_selection(Selection::Mask(mask))
}

fn two_views() -> Vec<Observation> {
    let obb = truth();
    let top_center = Point3::new(0.0, obb.top_y(), 0.0);
    vec![
        render(&obb, Point3::new(0.9, 0.9, 1.0)).with_raycast_hit(top_center),
        render(&obb, Point3::new(-1.0, 0.8, -0.6)),
    ]
}

/// Waits for the refinement of the current box to finish.
fn wait_for_refinement(events: &Receiver<SessionEvent>) -> MeasurementState {
    loop {
        match events.recv_timeout(Duration::from_secs(60)).unwrap() {
            SessionEvent::StateChanged(MeasurementState::RefinedVolumeReady) => {
                return MeasurementState::RefinedVolumeReady;
            }
            SessionEvent::RefinementUnavailable(_) => return MeasurementState::Settled,
            _ => {}
        }
    }
}

#[test]
fn fit_then_background_refinement() {
    let session = MeasurementSession::new(SessionConfig::fast()).unwrap();
    let events = session.subscribe();

    let result = session.fit(&two_views(), Some(0.0)).unwrap().unwrap();
    let m = result.measurement();
    assert_relative_eq!(m.length, 0.4, epsilon = 0.02);
    assert_relative_eq!(m.width, 0.2, epsilon = 0.02);
    assert_relative_eq!(m.height, 0.3, epsilon = 0.02);
    assert_eq!(result.id(), MeasurementId(1));
    assert_eq!(result.revision(), 0);
    assert_eq!(result.cloud().unwrap().view_count(), 2);

    assert_eq!(wait_for_refinement(&events), MeasurementState::RefinedVolumeReady);
    assert_eq!(session.state(), MeasurementState::RefinedVolumeReady);

    let current = session.current().unwrap();
    assert_eq!(current.box_id(), result.box_id());
    let refined = current.refined().unwrap();
    assert!(refined.carved);
    assert!(refined.voxel_volume <= current.obb().volume() * 1.001);
    assert!(refined.voxel_volume >= truth().volume() * 0.5);

    // Settling an already refined box does nothing.
    assert!(!session.settle().unwrap());
}

#[test]
fn stale_refinement_is_dropped_after_edit() {
    let session =
        MeasurementSession::new(SessionConfig::fast().with_auto_refine(false)).unwrap();
    let observations = two_views();
    let result = session.fit(&observations, Some(0.0)).unwrap().unwrap();
    assert_eq!(session.state(), MeasurementState::Settled);

    let ticket = session.prepare_refinement().unwrap();
    assert_eq!(ticket.box_id(), result.box_id());
    assert_eq!(session.state(), MeasurementState::RefinedVolumeCalculating);

    // Twist the box while refinement is "running".
    let camera = observations[0].camera;
    let center = camera.project(&result.obb().center()).unwrap();
    let gesture = Gesture::Rotate {
        touch: center + Vector2::new(80.0, 0.0),
        delta: Vector2::new(0.0, 40.0),
    };
    assert!(session.apply_edit(&gesture, &camera).unwrap());
    assert_eq!(session.state(), MeasurementState::Settled);
    assert_eq!(session.box_id().unwrap().revision, 1);

    let outcome = session.complete_refinement(ticket.box_id(), ticket.run());
    assert_eq!(outcome, MergeOutcome::Stale);
    assert!(session.current().unwrap().refined().is_none());
    assert_eq!(session.state(), MeasurementState::Settled);

    // Refining the edited box merges.
    let ticket = session.prepare_refinement().unwrap();
    assert_eq!(ticket.box_id().revision, 1);
    assert_eq!(
        session.complete_refinement(ticket.box_id(), ticket.run()),
        MergeOutcome::Merged
    );
    assert!(session.current().unwrap().refined().is_some());
}

#[test]
fn discard_then_refit_starts_new_measurement() {
    let session =
        MeasurementSession::new(SessionConfig::fast().with_auto_refine(false)).unwrap();
    let events = session.subscribe();
    let first = session.fit(&two_views(), None).unwrap().unwrap();
    let ticket = session.prepare_refinement().unwrap();

    assert_eq!(session.discard(), Some(first.id()));
    assert!(session.current().is_none());
    assert_eq!(
        session.complete_refinement(ticket.box_id(), ticket.run()),
        MergeOutcome::Cleared
    );
    assert!(matches!(
        session.fit_to_points(),
        Err(SessionError::NoMeasurement)
    ));

    let second = session.fit(&two_views(), None).unwrap().unwrap();
    assert!(second.id() > first.id());
    assert_eq!(session.state(), MeasurementState::Settled);

    let seen: Vec<_> = events.try_iter().collect();
    assert!(seen
        .iter()
        .any(|e| matches!(e, SessionEvent::Cleared(id) if *id == first.id())));
    assert!(seen
        .iter()
        .any(|e| matches!(e, SessionEvent::StateChanged(MeasurementState::Cleared))));
}

#[test]
fn empty_selection_reports_insufficient_data() {
    let session = MeasurementSession::new(SessionConfig::default()).unwrap();
    let events = session.subscribe();

    let obb = truth();
    let mut observation = render(&obb, Point3::new(0.9, 0.9, 1.0));
    observation.selection = Selection::Mask(SegmentationMask::from_fn(WIDTH, HEIGHT, |_, _| false));

    assert!(session.fit(&[observation], None).unwrap().is_none());
    assert_eq!(session.state(), MeasurementState::Idle);
    assert!(session.current().is_none());

    let seen: Vec<_> = events.try_iter().collect();
    assert!(seen.iter().any(|e| matches!(
        e,
        SessionEvent::InsufficientData { kept: 0, required: 20 }
    )));
}

#[test]
fn background_fit_publishes_result() {
    let session =
        MeasurementSession::new(SessionConfig::fast().with_auto_refine(false)).unwrap();
    let events = session.subscribe();

    session.request_fit(two_views(), Some(0.0)).unwrap();
    let result = loop {
        if let SessionEvent::ResultChanged(result) =
            events.recv_timeout(Duration::from_secs(60)).unwrap()
        {
            break result;
        }
    };
    assert_eq!(result.revision(), 0);
    assert_eq!(session.current().unwrap().box_id(), result.box_id());
}

#[test]
fn edits_interleaved_with_refinement_on_small_pool() {
    let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
    let session = MeasurementSession::new(SessionConfig::default()).unwrap();
    session.fit(&two_views(), Some(0.0)).unwrap().unwrap();

    let (done_tx, done_rx) = mpsc::channel();
    let worker = session.clone();
    std::thread::spawn(move || {
        // Run on a pool worker so edits and refinements share two threads.
        pool.install(|| {
            for i in 0..8 {
                let floor = if i % 2 == 0 { -0.01 } else { 0.0 };
                worker.extend_to_floor(floor).unwrap();
                worker.settle().unwrap();
                worker.fit_to_points().unwrap();
                worker.settle().unwrap();
            }
        });
        done_tx.send(()).unwrap();
    });

    done_rx
        .recv_timeout(Duration::from_secs(60))
        .expect("session stalled while edits raced background refinement");
    assert!(session.state().has_box());
}
