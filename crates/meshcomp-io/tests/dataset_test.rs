use std::fs;
use std::path::Path;

use meshcomp_core::{
    BenchmarkOptions, BenchmarkRunner, CancellationToken, MemorySink, MeshLoader,
    QuantizationCodec,
};
use meshcomp_io::{find_mesh_files, MeshFileLoader};
use tempfile::tempdir;

const TETRAHEDRON_OBJ: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 0 0 1\n\
                               f 1 3 2\nf 1 2 4\nf 1 4 3\nf 2 3 4\n";

const SQUARE_PLY: &str = "ply\nformat ascii 1.0\nelement vertex 4\n\
                          property float x\nproperty float y\nproperty float z\n\
                          element face 1\nproperty list uchar int vertex_indices\nend_header\n\
                          0 0 0\n2 0 0\n2 2 0\n0 2 0\n4 0 1 2 3\n";

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

#[test]
fn test_find_mesh_files() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("b/tetra.obj"), TETRAHEDRON_OBJ);
    write(&dir.path().join("a/deep/square.PLY"), SQUARE_PLY);
    write(&dir.path().join("a/notes.txt"), "not a mesh");
    write(&dir.path().join("z.obj"), TETRAHEDRON_OBJ);

    let files = find_mesh_files(dir.path()).unwrap();
    let relative: Vec<_> = files
        .iter()
        .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
        .collect();
    assert_eq!(
        relative,
        vec![
            Path::new("a/deep/square.PLY").to_path_buf(),
            Path::new("b/tetra.obj").to_path_buf(),
            Path::new("z.obj").to_path_buf(),
        ]
    );
}

#[cfg(unix)]
#[test]
fn test_find_mesh_files_ignores_directory_links() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("m.obj"), TETRAHEDRON_OBJ);
    fs::create_dir_all(dir.path().join("a")).unwrap();
    std::os::unix::fs::symlink(dir.path(), dir.path().join("a/loop")).unwrap();

    let files = find_mesh_files(dir.path()).unwrap();
    assert_eq!(files, vec![dir.path().join("m.obj")]);
}

#[test]
fn test_find_mesh_files_missing_root() {
    assert!(find_mesh_files("/definitely/not/a/dataset").is_err());
}

#[test]
fn test_loader_reads_both_formats() {
    let dir = tempdir().unwrap();
    let obj = dir.path().join("tetra.obj");
    let ply = dir.path().join("square.ply");
    write(&obj, TETRAHEDRON_OBJ);
    write(&ply, SQUARE_PLY);

    let loader = MeshFileLoader::new();
    let tetra = loader.load(&obj).unwrap();
    assert_eq!((tetra.num_vertices(), tetra.num_faces()), (4, 4));
    let square = loader.load(&ply).unwrap();
    assert_eq!((square.num_vertices(), square.num_faces()), (4, 2));
    assert!((square.surface_area().unwrap() - 4.0).abs() < 1e-9);
}

#[test]
fn test_benchmark_over_dataset() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("shapes/tetra.obj"), TETRAHEDRON_OBJ);
    write(&dir.path().join("shapes/square.ply"), SQUARE_PLY);
    write(&dir.path().join("broken.obj"), "v 0 0 0\nf 1 2 3\n");
    write(&dir.path().join("cloud.obj"), "v 0 0 0\nv 1 1 1\n");

    let paths = find_mesh_files(dir.path()).unwrap();
    assert_eq!(paths.len(), 4);

    let mut options = BenchmarkOptions::new();
    options.set_quantization_levels([8u8, 12].to_vec());
    options.set_metric_points(300);
    options.set_seed(Some(17));
    options.set_num_workers(Some(2));
    options.set_dataset_root(Some(dir.path().to_path_buf()));
    let runner = BenchmarkRunner::new(MeshFileLoader::new(), QuantizationCodec::new(), options);

    let mut sink = MemorySink::new();
    let summary = runner
        .run(&paths, &mut sink, &CancellationToken::new())
        .unwrap();
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.records, 4);

    let ids: Vec<&str> = sink.records().iter().map(|r| r.mesh_id.as_str()).collect();
    let square = Path::new("shapes").join("square.ply").display().to_string();
    let tetra = Path::new("shapes").join("tetra.obj").display().to_string();
    assert_eq!(ids, vec![square.as_str(), square.as_str(), tetra.as_str(), tetra.as_str()]);
    for record in sink.records() {
        assert!(record.chamfer_distance.unwrap() >= 0.0);
        assert!(record.hausdorff_distance.unwrap() >= 0.0);
    }
}
