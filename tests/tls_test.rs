mod common;

use common::{start_server, start_server_with, test_settings, FtpClient};
use driverftpd::core_tls::TlsConfig;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_rustls::rustls;
use tokio_rustls::TlsConnector;

/// Self-signed `localhost` certificate: the server config plus a client connector trusting it.
fn tls_pair() -> (TempDir, Arc<rustls::ServerConfig>, TlsConnector) {
    let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let cert_file = dir.path().join("cert.pem");
    let key_file = dir.path().join("key.pem");
    std::fs::write(&cert_file, cert.serialize_pem().unwrap()).unwrap();
    std::fs::write(&key_file, cert.serialize_private_key_pem()).unwrap();

    let server_config = TlsConfig {
        enabled: true,
        cert_file,
        key_file,
    }
    .load_server_config()
    .unwrap();

    let mut roots = rustls::RootCertStore::empty();
    roots
        .add(&rustls::Certificate(cert.serialize_der().unwrap()))
        .unwrap();
    let client_config = rustls::ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(roots)
        .with_no_client_auth();

    (dir, server_config, TlsConnector::from(Arc::new(client_config)))
}

#[tokio::test]
async fn auth_tls_protects_control_and_data_channels() {
    let (_certs, server_config, connector) = tls_pair();
    let server = start_server_with(test_settings(), Some(server_config)).await;
    let (mut client, (code, _)) = FtpClient::connect(server.addr).await;
    assert_eq!(code, 220);

    let (code, features) = client.cmd("FEAT").await;
    assert_eq!(code, 211);
    assert!(features.contains(" AUTH TLS\r\n"));
    assert!(features.contains(" PBSZ\r\n"));

    client.auth_tls(connector).await;
    client.login(common::USER, common::PASSWORD).await;
    assert_eq!(client.cmd("AUTH TLS").await.0, 503);

    assert_eq!(client.cmd("PBSZ 0").await.0, 200);
    assert_eq!(client.cmd("PROT P").await.0, 200);
    client.set_protected(true);

    let payload = b"sent over a protected data channel".to_vec();
    assert_eq!(client.stor("secret.txt", &payload).await, 226);
    let (code, received) = client.retr("secret.txt").await;
    assert_eq!(code, 226);
    assert_eq!(received, payload);

    let (code, names) = client.listing("NLST", "").await;
    assert_eq!(code, 226);
    assert_eq!(names, "secret.txt\r\n");

    // Back to clear data connections on the same protected control channel.
    assert_eq!(client.cmd("PROT C").await.0, 200);
    client.set_protected(false);
    let (code, received) = client.retr("secret.txt").await;
    assert_eq!(code, 226);
    assert_eq!(received, payload);

    assert_eq!(client.cmd("QUIT").await.0, 221);
}

#[tokio::test]
async fn auth_without_a_certificate_is_refused() {
    let server = start_server().await;
    let (mut client, _) = FtpClient::connect(server.addr).await;

    assert_eq!(client.cmd("AUTH TLS").await.0, 550);
    assert_eq!(client.cmd("AUTH KERBEROS").await.0, 504);
    // The plain control channel is still usable.
    client.login(common::USER, common::PASSWORD).await;
    assert_eq!(client.cmd("NOOP").await.0, 200);
}

#[tokio::test]
async fn prot_p_without_tls_falls_back_to_clear_data() {
    let server = start_server().await;
    std::fs::write(server.root.path().join("f.txt"), b"plain").unwrap();
    let mut client = FtpClient::connect_and_login(server.addr).await;

    assert_eq!(client.cmd("PROT P").await.0, 200);
    let (code, content) = client.retr("f.txt").await;
    assert_eq!(code, 226);
    assert_eq!(content, b"plain");
}
