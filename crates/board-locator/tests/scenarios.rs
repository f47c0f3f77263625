use approx::assert_relative_eq;
use board_locator::core::{BoardModel, DedupStrategy, FrameHeader, OrganizedCloud};
use board_locator::{
    classify_lines, locate_board_points, select_candidates, BoardLocator, ClassifiedLines,
    LineSegment, LocateError, LocatorParams,
};
use image::{Rgb, RgbImage};
use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};

const WIDTH: usize = 640;
const HEIGHT: usize = 480;

/// Board facing the camera: board x -> camera x, board y -> camera -y.
fn camera_from_board() -> Isometry3<f64> {
    Isometry3::from_parts(
        Translation3::new(-0.2, 0.25, 1.1),
        UnitQuaternion::from_axis_angle(&Vector3::x_axis(), std::f64::consts::PI),
    )
}

fn header() -> FrameHeader {
    FrameHeader::now("camera_rgb_optical_frame")
}

fn locator() -> BoardLocator {
    BoardLocator::new(LocatorParams::default()).expect("default params")
}

fn interior_points(board: &BoardModel, pose: &Isometry3<f64>) -> Vec<Point3<f64>> {
    board
        .grid_points()
        .iter()
        .map(|p| pose.transform_point(p))
        .collect()
}

/// Pixel at which interior corner (i, j) is imaged.
fn pixel(i: usize, j: usize) -> (usize, usize) {
    (100 + 40 * i, 400 - 40 * j)
}

/// Seven horizontal and seven near-vertical lines crossing at `pixel(i, j)`.
fn grid_lines() -> ClassifiedLines {
    let mut segs = Vec::new();
    for j in 1..=7 {
        let (_, v) = pixel(0, j);
        segs.push(LineSegment::from_coords(60, v as i32, 420, v as i32));
    }
    for i in 1..=7 {
        let (u, _) = pixel(i, 0);
        // Slope 400 so the intersection with row v lands at u + v / 400.
        segs.push(LineSegment::from_coords(u as i32, 0, u as i32 + 1, 400));
    }
    classify_lines(segs)
}

/// Cloud holding the board's interior corners at their pixels, empty elsewhere.
fn grid_cloud(board: &BoardModel, pose: &Isometry3<f64>) -> OrganizedCloud {
    let s = board.square_size();
    let mut cloud = OrganizedCloud::empty(WIDTH, HEIGHT);
    for i in 1..=7 {
        for j in 1..=7 {
            let p = pose.transform_point(&Point3::new(i as f64 * s, j as f64 * s, 0.0));
            let (u, v) = pixel(i, j);
            cloud.set(u, v, Some(p.cast::<f32>()));
        }
    }
    cloud
}

#[test]
fn noise_free_grid_recovers_pose_with_zero_score() {
    let board = BoardModel::default();
    let truth = camera_from_board();
    let points = interior_points(&board, &truth);

    let pose = locator()
        .locate_from_points(&header(), &points)
        .expect("pose");

    assert!(pose.score < 1e-18, "score {}", pose.score);
    assert_eq!(pose.child_frame_id, "chess_board");
    assert_eq!(pose.header.frame_id, "camera_rgb_optical_frame");
    assert_relative_eq!(
        pose.camera_from_board.to_homogeneous(),
        truth.to_homogeneous(),
        epsilon = 1e-9
    );
}

#[test]
fn outlier_in_dead_band_raises_score_only() {
    let board = BoardModel::default();
    let s = board.square_size();
    let truth = camera_from_board();
    let mut points = interior_points(&board, &truth);
    // Centre of a square: half a square from the grid on both axes.
    points.push(truth.transform_point(&Point3::new(4.5 * s, 4.5 * s, 0.0)));

    let pose = locator()
        .locate_from_points(&header(), &points)
        .expect("pose");

    assert_relative_eq!(pose.score, 0.5 * s * s, epsilon = 1e-12);
    assert_relative_eq!(
        pose.camera_from_board.to_homogeneous(),
        truth.to_homogeneous(),
        epsilon = 1e-9
    );
}

#[test]
fn outlier_among_corner_candidates_does_not_win() {
    let board = BoardModel::default();
    let s = board.square_size();
    let truth = camera_from_board();
    let mut points = interior_points(&board, &truth);
    // Off the board, beyond the a1 corner.
    let stray = Point3::new(-1.3 * s, -1.7 * s, 0.0);
    points.push(truth.transform_point(&stray));

    let candidates = select_candidates(&points, 0.05).expect("candidates");
    assert!(candidates.a1.contains(&(points.len() - 1)));

    let pose = locator()
        .locate_from_points(&header(), &points)
        .expect("pose");

    let stray_d2 = board.nearest_grid_distance_sq(&stray);
    assert_relative_eq!(stray_d2, 12.58 * s * s, epsilon = 1e-12);
    assert!(pose.score >= stray_d2 - 1e-12, "score {}", pose.score);
    assert_relative_eq!(
        pose.camera_from_board.to_homogeneous(),
        truth.to_homogeneous(),
        epsilon = 1e-9
    );
}

#[test]
fn lines_and_cloud_locate_board() {
    let board = BoardModel::default();
    let truth = camera_from_board();
    let lines = grid_lines();
    assert_eq!(lines.horizontal.len(), 7);
    assert_eq!(lines.vertical.len(), 7);

    let cloud = grid_cloud(&board, &truth);
    let pose = locator()
        .locate_from_lines(&header(), &lines, &cloud)
        .expect("pose");

    assert!(pose.score < 1e-9, "score {}", pose.score);
    assert_relative_eq!(
        pose.camera_from_board.to_homogeneous(),
        truth.to_homogeneous(),
        epsilon = 1e-5
    );
}

#[test]
fn emitted_points_land_on_board_grid() {
    let board = BoardModel::default();
    let truth = camera_from_board();
    let points = interior_points(&board, &truth);
    let params = LocatorParams {
        emit_points: true,
        target_frame_id: "target".to_string(),
        ..LocatorParams::default()
    };
    let hdr = header();

    let pose = BoardLocator::new(params)
        .expect("params")
        .locate_from_points(&hdr, &points)
        .expect("pose");
    assert_eq!(pose.child_frame_id, "target");

    let stamped = pose.points.expect("points emitted");
    assert_eq!(stamped.header, hdr);
    assert_eq!(stamped.points.len(), points.len());
    for (p, expected) in stamped.points.iter().zip(board.grid_points()) {
        assert_relative_eq!(*p, *expected, epsilon = 1e-9);
    }
}

#[test]
fn blank_frame_has_no_solution() {
    let image = RgbImage::new(64, 48);
    let cloud = OrganizedCloud::empty(64, 48);

    let (result, report) = locator().locate_detailed(&header(), &image, &cloud);
    let err = result.expect_err("no board in a black frame");

    assert_eq!(
        err,
        LocateError::InsufficientCandidates {
            a1: 0,
            a8: 0,
            h1: 0
        }
    );
    assert!(err.is_no_solution());
    assert!(err.to_string().starts_with("no solution"));
    assert!(report.lines.is_empty());
    assert!(report.board_points.is_empty());
    assert!(report.fit.is_none());
}

#[test]
fn mismatched_cloud_is_rejected() {
    let image = RgbImage::new(64, 48);
    let cloud = OrganizedCloud::empty(32, 48);

    let err = locator()
        .locate(&header(), &image, &cloud)
        .expect_err("size mismatch");
    assert!(matches!(err, LocateError::DimensionMismatch { .. }));
    assert!(!err.is_no_solution());
}

#[test]
fn one_sided_points_report_empty_buckets() {
    // All points share the centroid's x, so none leaves the dead band sideways.
    let points = vec![
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(0.0, 0.3, 1.0),
        Point3::new(0.0, -0.3, 1.0),
    ];
    let err = locator()
        .locate_from_points(&header(), &points)
        .expect_err("no h1 candidates");
    assert_eq!(
        err,
        LocateError::InsufficientCandidates {
            a1: 0,
            a8: 0,
            h1: 0
        }
    );
}

fn close_pair_scene() -> (ClassifiedLines, OrganizedCloud) {
    let lines = classify_lines([
        LineSegment::from_coords(0, 200, 600, 200),
        LineSegment::from_coords(100, 0, 101, 400),
        LineSegment::from_coords(103, 0, 104, 400),
    ]);
    let mut cloud = OrganizedCloud::empty(WIDTH, HEIGHT);
    cloud.set(100, 200, Some(Point3::new(0.0, 0.0, 1.0)));
    cloud.set(103, 200, Some(Point3::new(0.02, 0.0, 1.0)));
    (lines, cloud)
}

#[test]
fn nearby_intersections_collapse_under_dedup() {
    let (lines, cloud) = close_pair_scene();

    for strategy in [DedupStrategy::Linear, DedupStrategy::KdTree] {
        let merged = locate_board_points(&lines, &cloud, 0.03, strategy);
        assert_eq!(merged.points, vec![Point3::new(0.0, 0.0, 1.0)]);
        assert_eq!(merged.stats.pairs, 2);
        assert_eq!(merged.stats.duplicates, 1);
        assert_eq!(merged.stats.kept, 1);

        let separate = locate_board_points(&lines, &cloud, 0.0, strategy);
        assert_eq!(separate.points.len(), 2);
        assert_eq!(separate.stats.duplicates, 0);
    }
}

#[test]
fn pixels_without_depth_are_counted() {
    let (lines, mut cloud) = close_pair_scene();
    cloud.set(103, 200, None);

    let out = locate_board_points(&lines, &cloud, 0.03, DedupStrategy::Linear);
    assert_eq!(out.stats.missing_depth, 1);
    assert_eq!(out.stats.kept, 1);
}

/// Pinhole camera looking at a board whose lines are tilted in the image.
struct RenderedBoard {
    camera_from_board: Isometry3<f64>,
    focal: f64,
    principal: (f64, f64),
}

impl RenderedBoard {
    fn new() -> Self {
        Self {
            camera_from_board: Isometry3::from_parts(
                Translation3::new(-0.2, 0.25, 1.1),
                UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.05)
                    * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), std::f64::consts::PI),
            ),
            focal: 866.0,
            principal: (320.0, 240.0),
        }
    }

    /// Camera-frame point where the ray through pixel (u, v) meets the
    /// board plane, and the same point in board coordinates.
    fn hit(&self, u: u32, v: u32) -> (Point3<f64>, Point3<f64>) {
        let ray = Vector3::new(
            (u as f64 - self.principal.0) / self.focal,
            (v as f64 - self.principal.1) / self.focal,
            1.0,
        );
        let board_from_camera = self.camera_from_board.inverse();
        let origin = board_from_camera.transform_point(&Point3::origin());
        let dir = board_from_camera.transform_vector(&ray);
        let lambda = -origin.z / dir.z;
        (Point3::from(ray * lambda), origin + dir * lambda)
    }

    fn image(&self, s: f64) -> RgbImage {
        RgbImage::from_fn(WIDTH as u32, HEIGHT as u32, |u, v| {
            let (_, b) = self.hit(u, v);
            let (i, j) = ((b.x / s).floor(), (b.y / s).floor());
            let on_board = (0.0..8.0).contains(&i) && (0.0..8.0).contains(&j);
            if on_board && (i + j) as i64 % 2 == 0 {
                Rgb([30, 40, 230])
            } else {
                Rgb([30, 30, 30])
            }
        })
    }

    fn cloud(&self) -> OrganizedCloud {
        OrganizedCloud::from_fn(WIDTH, HEIGHT, |x, y| {
            Some(self.hit(x as u32, y as u32).0.cast::<f32>())
        })
    }
}

#[test]
fn rendered_board_is_located_from_image_and_cloud() {
    let board = BoardModel::default();
    let scene = RenderedBoard::new();
    let image = scene.image(board.square_size());
    let cloud = scene.cloud();

    let (result, report) = locator().locate_detailed(&header(), &image, &cloud);
    assert!(!report.lines.horizontal.is_empty());
    assert!(!report.lines.vertical.is_empty());
    assert_eq!(report.board_points.len(), 49, "stats {:?}", report.intersections);

    let pose = result.expect("pose");
    let truth = scene.camera_from_board;
    let t_err = (pose.camera_from_board.translation.vector - truth.translation.vector).norm();
    let r_err = pose.camera_from_board.rotation.angle_to(&truth.rotation);
    assert!(t_err < 0.01, "translation off by {t_err} m");
    assert!(r_err < 0.02, "rotation off by {r_err} rad");
}
