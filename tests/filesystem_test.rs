mod common;

use common::{start_server, FtpClient};

#[tokio::test]
async fn working_directory_navigation() {
    let server = start_server().await;
    std::fs::create_dir_all(server.root.path().join("a/b")).unwrap();
    let mut client = FtpClient::connect_and_login(server.addr).await;

    let (code, text) = client.cmd("PWD").await;
    assert_eq!(code, 257);
    assert!(text.contains("\"/\""));

    assert_eq!(client.cmd("CWD a/b").await.0, 250);
    assert!(client.cmd("PWD").await.1.contains("\"/a/b\""));

    assert_eq!(client.cmd("CDUP").await.0, 250);
    assert!(client.cmd("XPWD").await.1.contains("\"/a\""));

    assert_eq!(client.cmd("CWD missing").await.0, 550);
    assert!(client.cmd("PWD").await.1.contains("\"/a\""));

    // Climbing above the root stays at the root.
    assert_eq!(client.cmd("CWD ../../..").await.0, 250);
    assert!(client.cmd("PWD").await.1.contains("\"/\""));
}

#[tokio::test]
async fn directories_are_created_and_removed() {
    let server = start_server().await;
    let mut client = FtpClient::connect_and_login(server.addr).await;

    assert_eq!(client.cmd("MKD docs").await.0, 250);
    assert!(server.root.path().join("docs").is_dir());
    assert_eq!(client.cmd("MKD docs").await.0, 550);
    assert_eq!(client.cmd("XMKD docs/inner").await.0, 250);

    assert_eq!(client.cmd("RMD docs").await.0, 550);
    assert_eq!(client.cmd("RMD docs/inner").await.0, 250);
    assert_eq!(client.cmd("XRMD /docs").await.0, 250);
    assert!(!server.root.path().join("docs").exists());
    assert_eq!(client.cmd("RMD docs").await.0, 550);
}

#[tokio::test]
async fn files_are_deleted() {
    let server = start_server().await;
    std::fs::write(server.root.path().join("f.txt"), b"x").unwrap();
    std::fs::create_dir(server.root.path().join("d")).unwrap();
    let mut client = FtpClient::connect_and_login(server.addr).await;

    assert_eq!(client.cmd("DELE f.txt").await.0, 250);
    assert!(!server.root.path().join("f.txt").exists());
    assert_eq!(client.cmd("DELE f.txt").await.0, 550);
    assert_eq!(client.cmd("DELE d").await.0, 550);
}

#[tokio::test]
async fn rename_of_a_missing_path_leaves_nothing_pending() {
    let server = start_server().await;
    let mut client = FtpClient::connect_and_login(server.addr).await;

    assert_eq!(client.cmd("RNFR ghost.txt").await.0, 550);
    assert_eq!(client.cmd("RNTO new.txt").await.0, 550);
    assert!(!server.root.path().join("new.txt").exists());
}

#[tokio::test]
async fn rename_moves_the_file() {
    let server = start_server().await;
    std::fs::write(server.root.path().join("old.txt"), b"content").unwrap();
    let mut client = FtpClient::connect_and_login(server.addr).await;

    assert_eq!(client.cmd("RNFR old.txt").await.0, 350);
    assert_eq!(client.cmd("RNTO new.txt").await.0, 250);

    assert_eq!(client.cmd("SIZE old.txt").await.0, 550);
    assert_eq!(client.cmd("SIZE new.txt").await.0, 213);

    // The pending rename is consumed by the successful RNTO.
    assert_eq!(client.cmd("RNTO again.txt").await.0, 550);
}

#[tokio::test]
async fn failed_rnto_keeps_the_pending_source() {
    let server = start_server().await;
    std::fs::write(server.root.path().join("old.txt"), b"content").unwrap();
    let mut client = FtpClient::connect_and_login(server.addr).await;

    assert_eq!(client.cmd("RNFR old.txt").await.0, 350);
    assert_eq!(client.cmd("RNTO no/such/dir/new.txt").await.0, 550);
    assert_eq!(client.cmd("RNTO new.txt").await.0, 250);
    assert!(server.root.path().join("new.txt").exists());
}

#[tokio::test]
async fn path_arguments_ignore_surrounding_whitespace() {
    let server = start_server().await;
    std::fs::write(server.root.path().join("a.txt"), b"12345").unwrap();
    std::fs::create_dir(server.root.path().join("sub")).unwrap();
    let mut client = FtpClient::connect_and_login(server.addr).await;

    assert_eq!(client.cmd("SIZE a.txt ").await.1, "213 5\r\n");
    assert_eq!(client.cmd("SIZE  a.txt").await.1, "213 5\r\n");
    assert_eq!(client.cmd("MDTM a.txt  ").await.0, 213);
    assert_eq!(client.cmd("CWD sub ").await.0, 250);
    assert!(client.cmd("PWD").await.1.contains("\"/sub\""));
}

#[tokio::test]
async fn size_and_mdtm() {
    let server = start_server().await;
    std::fs::write(server.root.path().join("f.txt"), b"12345").unwrap();
    std::fs::create_dir(server.root.path().join("d")).unwrap();
    let mut client = FtpClient::connect_and_login(server.addr).await;

    let (code, text) = client.cmd("SIZE f.txt").await;
    assert_eq!(code, 213);
    assert_eq!(text, "213 5\r\n");
    assert_eq!(client.cmd("SIZE d").await.0, 550);
    assert_eq!(client.cmd("SIZE missing").await.0, 550);

    let (code, text) = client.cmd("MDTM f.txt").await;
    assert_eq!(code, 213);
    let stamp = text.trim_end().trim_start_matches("213 ");
    assert_eq!(stamp.len(), 14);
    assert!(stamp.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(client.cmd("MDTM missing").await.0, 550);
}

#[tokio::test]
async fn paths_cannot_leave_the_root() {
    let server = start_server().await;
    let outside = tempfile::tempdir().unwrap();
    std::fs::write(outside.path().join("secret.txt"), b"secret").unwrap();
    let mut client = FtpClient::connect_and_login(server.addr).await;

    let escape = format!("../../../../../../..{}/secret.txt", outside.path().display());
    assert_eq!(client.cmd(&format!("SIZE {}", escape)).await.0, 550);
    assert_eq!(client.cmd(&format!("DELE {}", escape)).await.0, 550);
    assert!(outside.path().join("secret.txt").exists());
}

#[cfg(unix)]
#[tokio::test]
async fn symlinks_out_of_the_root_are_refused() {
    let server = start_server().await;
    let outside = tempfile::tempdir().unwrap();
    std::fs::write(outside.path().join("secret.txt"), b"secret").unwrap();
    std::os::unix::fs::symlink(outside.path(), server.root.path().join("link")).unwrap();
    let mut client = FtpClient::connect_and_login(server.addr).await;

    assert_eq!(client.cmd("SIZE link/secret.txt").await.0, 550);
    assert_eq!(client.retr("link/secret.txt").await.0, 550);
    assert_eq!(client.cmd("DELE link/secret.txt").await.0, 550);
    assert!(outside.path().join("secret.txt").exists());
}
