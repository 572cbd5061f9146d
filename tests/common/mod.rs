#![allow(dead_code)]

use driverftpd::core_auth::{hash_password, parse_passwd};
use driverftpd::{LocalDriver, Server, Settings};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_rustls::rustls;
use tokio_rustls::TlsConnector;

pub const USER: &str = "alice";
pub const PASSWORD: &str = "secret";

const REPLY_TIMEOUT: Duration = Duration::from_secs(10);

pub trait Io: AsyncRead + AsyncWrite + Unpin + Send + Sync {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send + Sync> Io for T {}

/// A running server over a local driver rooted in a temporary directory.
pub struct TestServer {
    pub addr: SocketAddr,
    pub root: TempDir,
    pub server: Server<LocalDriver>,
    task: JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub fn test_settings() -> Settings {
    Settings {
        listen_host: "127.0.0.1".into(),
        listen_port: 0,
        idle_timeout: Duration::from_secs(30),
        data_timeout: Duration::from_secs(5),
        ..Settings::default()
    }
}

pub async fn start_server() -> TestServer {
    start_server_with(test_settings(), None).await
}

pub async fn start_server_with(
    settings: Settings,
    tls: Option<Arc<rustls::ServerConfig>>,
) -> TestServer {
    let root = tempfile::tempdir().unwrap();
    let hashed = hash_password(PASSWORD, Some(4)).unwrap();
    let users = parse_passwd(&format!("{}:{}\n", USER, hashed));

    let mut driver = LocalDriver::new(root.path(), users, settings).unwrap();
    if let Some(tls) = tls {
        driver = driver.with_tls(tls);
    }
    let server = Server::new(driver).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let serving = server.clone();
    let task = tokio::spawn(async move {
        let _ = serving.serve(listener).await;
    });

    TestServer {
        addr,
        root,
        server,
        task,
    }
}

/// Minimal FTP client speaking just enough of the protocol for the tests.
pub struct FtpClient {
    control: BufReader<Box<dyn Io>>,
    tls: Option<TlsConnector>,
    protected: bool,
}

impl FtpClient {
    /// Connects and returns the client with the greeting reply.
    pub async fn connect(addr: SocketAddr) -> (Self, (u16, String)) {
        let stream = TcpStream::connect(addr).await.unwrap();
        let mut client = FtpClient {
            control: BufReader::new(Box::new(stream)),
            tls: None,
            protected: false,
        };
        let greeting = client.read_reply().await;
        (client, greeting)
    }

    pub async fn connect_and_login(addr: SocketAddr) -> Self {
        let (mut client, (code, _)) = Self::connect(addr).await;
        assert_eq!(code, 220);
        client.login(USER, PASSWORD).await;
        client
    }

    pub async fn send(&mut self, line: &str) {
        let stream = self.control.get_mut();
        stream
            .write_all(format!("{}\r\n", line).as_bytes())
            .await
            .unwrap();
        stream.flush().await.unwrap();
    }

    /// Reads one reply, joining multi-line replies. Panics if the server hangs up.
    pub async fn read_reply(&mut self) -> (u16, String) {
        self.try_read_reply().await.expect("connection closed")
    }

    /// Reads one reply, or `None` when the server closed the connection.
    pub async fn try_read_reply(&mut self) -> Option<(u16, String)> {
        let mut text = String::new();
        let mut first: Option<String> = None;
        loop {
            let mut line = String::new();
            let n = timeout(REPLY_TIMEOUT, self.control.read_line(&mut line))
                .await
                .expect("reply timed out")
                .ok()?;
            if n == 0 {
                return None;
            }
            text.push_str(&line);

            match &first {
                None => {
                    let code = line.get(..3)?.to_string();
                    if line.as_bytes().get(3) == Some(&b'-') {
                        first = Some(code);
                    } else {
                        return Some((code.parse().ok()?, text));
                    }
                }
                Some(code) => {
                    if line.starts_with(&format!("{} ", code)) {
                        return Some((code.parse().ok()?, text));
                    }
                }
            }
        }
    }

    pub async fn cmd(&mut self, line: &str) -> (u16, String) {
        self.send(line).await;
        self.read_reply().await
    }

    pub async fn login(&mut self, user: &str, pass: &str) {
        assert_eq!(self.cmd(&format!("USER {}", user)).await.0, 331);
        let (code, text) = self.cmd(&format!("PASS {}", pass)).await;
        assert_eq!(code, 230, "login failed: {}", text);
    }

    /// PASV, returning the advertised data address.
    pub async fn pasv(&mut self) -> SocketAddr {
        let (code, text) = self.cmd("PASV").await;
        assert_eq!(code, 227, "{}", text);
        parse_227(&text)
    }

    /// EPSV, returning the port.
    pub async fn epsv(&mut self) -> u16 {
        let (code, text) = self.cmd("EPSV").await;
        assert_eq!(code, 229, "{}", text);
        parse_229(&text)
    }

    async fn wrap_data(&self, stream: TcpStream) -> Box<dyn Io> {
        match (&self.tls, self.protected) {
            (Some(connector), true) => {
                let name = rustls::ServerName::try_from("localhost").unwrap();
                Box::new(connector.connect(name, stream).await.unwrap())
            }
            _ => Box::new(stream),
        }
    }

    /// Passive download: returns the final reply code and the bytes received.
    pub async fn retr(&mut self, path: &str) -> (u16, Vec<u8>) {
        let addr = self.pasv().await;
        let data = TcpStream::connect(addr).await.unwrap();
        let (code, _) = self.cmd(&format!("RETR {}", path)).await;
        if code != 150 {
            return (code, Vec::new());
        }

        let mut data = self.wrap_data(data).await;
        let mut content = Vec::new();
        data.read_to_end(&mut content).await.unwrap();
        let (code, _) = self.read_reply().await;
        (code, content)
    }

    /// Passive upload with STOR or APPE: returns the final reply code.
    pub async fn upload(&mut self, verb: &str, path: &str, content: &[u8]) -> u16 {
        let addr = self.pasv().await;
        let data = TcpStream::connect(addr).await.unwrap();
        let (code, _) = self.cmd(&format!("{} {}", verb, path)).await;
        if code != 150 {
            return code;
        }

        let mut data = self.wrap_data(data).await;
        data.write_all(content).await.unwrap();
        data.shutdown().await.unwrap();
        drop(data);
        self.read_reply().await.0
    }

    pub async fn stor(&mut self, path: &str, content: &[u8]) -> u16 {
        self.upload("STOR", path, content).await
    }

    /// Passive LIST or NLST: returns the final reply code and the listing text.
    pub async fn listing(&mut self, verb: &str, arg: &str) -> (u16, String) {
        let addr = self.pasv().await;
        let data = TcpStream::connect(addr).await.unwrap();
        let line = if arg.is_empty() {
            verb.to_string()
        } else {
            format!("{} {}", verb, arg)
        };
        let (code, _) = self.cmd(&line).await;
        if code != 150 {
            return (code, String::new());
        }

        let mut data = self.wrap_data(data).await;
        let mut content = String::new();
        data.read_to_string(&mut content).await.unwrap();
        (self.read_reply().await.0, content)
    }

    /// AUTH TLS followed by the client side of the handshake.
    pub async fn auth_tls(&mut self, connector: TlsConnector) {
        let (code, text) = self.cmd("AUTH TLS").await;
        assert_eq!(code, 234, "{}", text);

        let placeholder: Box<dyn Io> = Box::new(tokio::io::duplex(1).0);
        let stream = std::mem::replace(&mut self.control, BufReader::new(placeholder)).into_inner();
        let name = rustls::ServerName::try_from("localhost").unwrap();
        let tls = connector.connect(name, stream).await.unwrap();
        self.control = BufReader::new(Box::new(tls));
        self.tls = Some(connector);
    }

    pub fn set_protected(&mut self, protected: bool) {
        self.protected = protected;
    }
}

pub fn parse_227(text: &str) -> SocketAddr {
    let start = text.find('(').unwrap() + 1;
    let end = text.find(')').unwrap();
    let nums: Vec<u16> = text[start..end]
        .split(',')
        .map(|n| n.trim().parse().unwrap())
        .collect();
    assert_eq!(nums.len(), 6);
    let ip = format!("{}.{}.{}.{}", nums[0], nums[1], nums[2], nums[3]);
    format!("{}:{}", ip, nums[4] * 256 + nums[5]).parse().unwrap()
}

pub fn parse_229(text: &str) -> u16 {
    let start = text.find("(|||").unwrap() + 4;
    let end = text[start..].find('|').unwrap() + start;
    text[start..end].parse().unwrap()
}

/// Polls until `cond` holds or the deadline passes.
pub async fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    cond()
}
