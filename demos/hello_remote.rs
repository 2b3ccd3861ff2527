use remote_vfs::backend::MemoryBackend;
use remote_vfs::{Capability, FileSystemManager, FileSystemOptions, OpenMode, Provider};

fn main() {
    // one in-process backend plays both the HDFS cluster and the S3 buckets
    let backend = MemoryBackend::new();
    backend.put("namenode:8020", "/data/file.csv", b"id,value\n1,42\n");
    backend.set_property("namenode:8020", "dfs.support.append", "true");

    let manager = FileSystemManager::new();
    manager.register(Provider::hdfs(backend.clone()));
    manager.register(Provider::s3(backend.clone()));
    println!("Schemes: {:?}", manager.schemes());

    let options = FileSystemOptions::builder().create_root(true).build();

    // parses the name, connects to `namenode:8020` and caches the file system
    let mut csv = manager
        .resolve_file("hdfs://namenode:8020/data/file.csv", &options)
        .unwrap();
    println!("{} is a {:?}", csv.name(), csv.file_type().unwrap());

    // appending is only allowed because the cluster reports `dfs.support.append=true`
    let fs = csv.file_system().unwrap();
    assert!(fs.has_capability(Capability::AppendContent));
    csv.open(OpenMode::Append).unwrap();
    csv.write_all(b"2,43\n").unwrap();
    csv.close().unwrap();

    // a closed file object cannot be reopened, resolve the name again
    let mut csv = fs.resolve_file("data/file.csv").unwrap();
    let content = csv.read_content().unwrap();
    print!("{}", String::from_utf8(content).unwrap());

    // same bucket, same file system
    let a = manager
        .resolve_file_system("s3://bucket-a/reports/2024.csv", &options)
        .unwrap();
    let b = manager
        .resolve_file_system("s3://bucket-a/archive/", &options)
        .unwrap();
    assert!(std::sync::Arc::ptr_eq(&a, &b));

    // S3 has no rename
    let report = a.resolve_file("/reports/2024.csv").unwrap();
    let target = a.root_name().resolve("/reports/latest.csv").unwrap();
    match report.rename_to(&target) {
        Ok(()) => println!("renamed"),
        Err(e) => println!("rename refused: {e}"),
    }

    manager.close().unwrap();
    assert!(fs.is_closed());
    println!("{} connections opened", backend.stats().connects);
}
