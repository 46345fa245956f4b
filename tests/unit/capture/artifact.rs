use super::*;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("unit_artifact").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn assemble_concatenates_in_order() {
    let chunks: Vec<Vec<u8>> = vec![b"AA".to_vec(), b"B".to_vec(), b"CCC".to_vec()];
    let a = Artifact::assemble(chunks.iter().map(Vec::as_slice), "animation.webm", "video/webm")
        .unwrap();
    assert_eq!(a.data(), b"AABCCC");
    assert_eq!(a.file_name(), "animation.webm");
    assert_eq!(a.mime_type(), "video/webm");
    assert_eq!(a.len(), 6);
    assert!(!a.is_empty());
}

#[test]
fn assemble_requires_file_name() {
    let res = Artifact::assemble([b"x".as_slice()], "", "video/webm");
    assert!(matches!(res, Err(CaptureError::Export(_))));
}

#[test]
fn file_saver_writes_into_directory() {
    let dir = scratch_dir("writes");
    let artifact = Artifact::assemble([b"webm".as_slice()], "out.webm", "video/webm").unwrap();
    let mut saver = FileSaver::new(&dir);
    saver.save(&artifact).unwrap();

    let path = saver.path_for(&artifact);
    assert_eq!(std::fs::read(&path).unwrap(), b"webm");
    assert!(!dir.join("out.partial").exists());
}

#[test]
fn file_saver_respects_overwrite_flag() {
    let dir = scratch_dir("overwrite");
    let artifact = Artifact::assemble([b"1".as_slice()], "out.webm", "video/webm").unwrap();
    FileSaver::new(&dir).save(&artifact).unwrap();

    let mut strict = FileSaver::new(&dir).with_overwrite(false);
    assert!(matches!(strict.save(&artifact), Err(CaptureError::Export(_))));

    let again = Artifact::assemble([b"2".as_slice()], "out.webm", "video/webm").unwrap();
    FileSaver::new(&dir).save(&again).unwrap();
    assert_eq!(std::fs::read(dir.join("out.webm")).unwrap(), b"2");
}

#[test]
fn in_memory_saver_clones_share_storage() {
    let probe = InMemorySaver::new();
    let mut saver = probe.clone();
    let artifact = Artifact::assemble([b"z".as_slice()], "a.webm", "video/webm").unwrap();
    saver.save(&artifact).unwrap();
    saver.save(&artifact).unwrap();
    assert_eq!(probe.saved().len(), 2);
    assert_eq!(probe.saved()[0], artifact);
}
