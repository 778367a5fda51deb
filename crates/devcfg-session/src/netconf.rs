//! NETCONF transport.
//!
//! Messages use NETCONF 1.0 end-of-message framing (`]]>]]>`). Replies are
//! parsed with `quick-xml`: `<rpc-error>` elements become errors or warnings
//! by severity, and `<configuration-output>` text is re-emitted between dump
//! markers so [`devcfg_codec::dump`] can scope it.
//!
//! [`NetconfTransport::connect`] runs the protocol over the SSH `netconf`
//! subsystem; [`NetconfTransport::over`] runs it over any byte stream.
//!
//! # Example
//!
//! ```ignore
//! use devcfg_session::{DeviceConfig, NetconfTransport, Session, SessionMode};
//!
//! let config = DeviceConfig::for_host("192.0.2.10");
//! let transport = NetconfTransport::connect(&config, SessionMode::Transactional).await?;
//! let mut session = Session::new(Box::new(transport));
//! ```

use async_trait::async_trait;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, instrument, warn};

use devcfg_codec::dump;

use crate::device::DeviceConfig;
use crate::error::{SessionError, SessionResult};
use crate::ssh::SshLink;
use crate::transport::{DeviceTransport, Rpc, RpcMessage, RpcReply, SessionMode};

/// NETCONF 1.0 end-of-message delimiter.
pub const DELIMITER: &str = "]]>]]>";

const BASE_NS: &str = "urn:ietf:params:xml:ns:netconf:base:1.0";

const CLIENT_HELLO: &str = r#"<?xml version="1.0" encoding="UTF-8"?><hello xmlns="urn:ietf:params:xml:ns:netconf:base:1.0"><capabilities><capability>urn:ietf:params:netconf:base:1.0</capability></capabilities></hello>"#;

/// Commit log used when direct mode applies a load immediately.
const DIRECT_COMMIT_LOG: &str = "devcfg direct apply";

/// A byte stream NETCONF messages travel over.
pub trait NetconfStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> NetconfStream for T {}

/// Where the current request stands on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wire {
    /// No request outstanding.
    Idle,
    /// A request is being written. Seen on entry, it means an earlier write
    /// was abandoned part way and the framing is lost.
    Writing,
    /// A request was sent in full; its reply may still arrive and is
    /// skipped by message id.
    Awaiting,
}

/// A NETCONF session.
pub struct NetconfTransport {
    target: String,
    mode: SessionMode,
    stream: Box<dyn NetconfStream>,
    link: Option<SshLink>,
    buffer: Vec<u8>,
    next_id: u64,
    wire: Wire,
}

impl NetconfTransport {
    /// Opens the SSH `netconf` subsystem on the device and exchanges hellos.
    ///
    /// In [`SessionMode::Direct`] every load is committed right away without
    /// taking the lock.
    #[instrument(skip(config), fields(device = %config.target()))]
    pub async fn connect(config: &DeviceConfig, mode: SessionMode) -> SessionResult<Self> {
        config.validate()?;
        let (link, stream) = SshLink::open(config).await?;
        match Self::over(Box::pin(stream), config.target(), mode).await {
            Ok(mut transport) => {
                transport.link = Some(link);
                Ok(transport)
            }
            Err(err) => {
                link.disconnect().await;
                Err(err)
            }
        }
    }

    /// Runs NETCONF over an established `stream`, starting with the hello
    /// exchange.
    pub async fn over<S>(stream: S, target: impl Into<String>, mode: SessionMode) -> SessionResult<Self>
    where
        S: NetconfStream + 'static,
    {
        let mut transport = Self {
            target: target.into(),
            mode,
            stream: Box::new(stream),
            link: None,
            buffer: Vec::new(),
            next_id: 0,
            wire: Wire::Idle,
        };

        transport.send(CLIENT_HELLO).await?;
        let hello = transport
            .receive()
            .await
            .map_err(|e| SessionError::connect(&transport.target, e.to_string()))?;
        if !hello.contains("hello") {
            return Err(SessionError::connect(
                &transport.target,
                "device did not answer with a NETCONF hello",
            ));
        }
        transport.wire = Wire::Idle;

        info!(device = %transport.target, %mode, "netconf session established");
        Ok(transport)
    }

    async fn send(&mut self, body: &str) -> SessionResult<()> {
        self.wire = Wire::Writing;
        self.stream.write_all(body.as_bytes()).await?;
        self.stream.write_all(DELIMITER.as_bytes()).await?;
        self.stream.write_all(b"\n").await?;
        self.stream.flush().await?;
        self.wire = Wire::Awaiting;
        Ok(())
    }

    async fn receive(&mut self) -> SessionResult<String> {
        loop {
            if let Some(message) = take_message(&mut self.buffer) {
                return Ok(message);
            }
            let mut chunk = [0u8; 8192];
            let n = self.stream.read(&mut chunk).await?;
            if n == 0 {
                return Err(SessionError::transport("device closed the connection"));
            }
            self.buffer.extend_from_slice(&chunk[..n]);
        }
    }

    /// Sends one rpc and waits for the reply carrying its message id.
    ///
    /// Replies to earlier, abandoned requests are skipped. A reply without
    /// a message id cannot be matched and is an error.
    async fn exchange(&mut self, rpc: &Rpc) -> SessionResult<RpcReply> {
        if self.wire == Wire::Writing {
            return Err(SessionError::transport(
                "an interrupted request left the connection unusable",
            ));
        }

        self.next_id += 1;
        let id = self.next_id.to_string();
        let body = rpc_body(rpc);
        self.send(&format!(
            r#"<rpc message-id="{id}" xmlns="{BASE_NS}">{body}</rpc>"#
        ))
        .await?;

        loop {
            let message = self.receive().await?;
            let (message_id, reply) = parse_reply(&message)?;
            match message_id {
                Some(got) if got == id => {
                    self.wire = Wire::Idle;
                    return Ok(reply);
                }
                Some(got) => {
                    debug!(stale = %got, expected = %id, "discarding stale reply");
                }
                None => {
                    return Err(SessionError::transport(format!(
                        "reply to {} carries no message-id",
                        rpc.name()
                    )))
                }
            }
        }
    }

    /// Sends `<close-session/>` unless the framing is lost, then drops the
    /// connection.
    async fn close(&mut self) -> SessionResult<RpcReply> {
        let reply = if self.wire == Wire::Writing {
            warn!(device = %self.target, "connection unusable, closing without close-session");
            Ok(RpcReply::ok())
        } else {
            self.exchange(&Rpc::Close).await
        };

        match &self.link {
            Some(link) => link.disconnect().await,
            None => {
                if let Err(err) = self.stream.shutdown().await {
                    debug!(error = %err, "stream already closed");
                }
            }
        }
        reply
    }
}

#[async_trait]
impl DeviceTransport for NetconfTransport {
    fn target(&self) -> &str {
        &self.target
    }

    fn mode(&self) -> SessionMode {
        self.mode
    }

    async fn call(&mut self, rpc: &Rpc) -> SessionResult<RpcReply> {
        match rpc {
            Rpc::LoadSet { .. } if self.mode == SessionMode::Direct => {
                let mut reply = self.exchange(rpc).await?;
                if reply.is_ok() {
                    let commit = Rpc::Commit {
                        log: DIRECT_COMMIT_LOG.to_string(),
                    };
                    reply.merge(self.exchange(&commit).await?);
                }
                Ok(reply)
            }
            Rpc::Close => self.close().await,
            _ => self.exchange(rpc).await,
        }
    }
}

/// Removes the first complete message from `buffer`.
fn take_message(buffer: &mut Vec<u8>) -> Option<String> {
    let delimiter = DELIMITER.as_bytes();
    let end = buffer
        .windows(delimiter.len())
        .position(|window| window == delimiter)?;
    let message = String::from_utf8_lossy(&buffer[..end]).trim().to_string();
    buffer.drain(..end + delimiter.len());
    Some(message)
}

/// XML body of an rpc, without the `<rpc>` envelope.
fn rpc_body(rpc: &Rpc) -> String {
    match rpc {
        Rpc::Lock => "<lock><target><candidate/></target></lock>".to_string(),
        Rpc::Unlock => "<unlock><target><candidate/></target></unlock>".to_string(),
        Rpc::Discard => "<discard-changes/>".to_string(),
        Rpc::LoadSet { lines } => format!(
            r#"<load-configuration action="set" format="text"><configuration-set>{}</configuration-set></load-configuration>"#,
            escape(lines.join("\n").as_str())
        ),
        Rpc::Commit { log } => format!(
            "<commit-configuration><log>{}</log></commit-configuration>",
            escape(log.as_str())
        ),
        Rpc::Command { command } => format!(
            r#"<command format="text">{}</command>"#,
            escape(command.as_str())
        ),
        Rpc::Close => "<close-session/>".to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Severity {
    Error,
    Warning,
}

/// An error or warning element being read.
#[derive(Debug)]
struct Pending {
    severity: Severity,
    message: String,
    path: Option<String>,
    element: Option<String>,
}

impl Pending {
    fn new(severity: Severity) -> Self {
        Self {
            severity,
            message: String::new(),
            path: None,
            element: None,
        }
    }

    fn finish(self, reply: &mut RpcReply) {
        let mut message = RpcMessage::new(self.message);
        message.path = self.path;
        message.element = self.element;
        match self.severity {
            Severity::Error => reply.errors.push(message),
            Severity::Warning => reply.warnings.push(message),
        }
    }
}

fn local_name(name: &[u8]) -> String {
    String::from_utf8_lossy(name).into_owned()
}

fn attribute(start: &BytesStart<'_>, name: &str) -> Option<String> {
    start
        .attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name.as_bytes())
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

/// Parses an `<rpc-reply>` into its message id and an [`RpcReply`].
fn parse_reply(xml: &str) -> SessionResult<(Option<String>, RpcReply)> {
    let mut reader = Reader::from_str(xml);
    let mut reply = RpcReply::default();
    let mut message_id = None;
    let mut stack: Vec<String> = Vec::new();
    let mut pending: Option<Pending> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| SessionError::transport(format!("malformed reply: {e}")))?;
        match event {
            Event::Start(start) => {
                let name = local_name(start.local_name().as_ref());
                match name.as_str() {
                    "rpc-reply" => message_id = attribute(&start, "message-id"),
                    "rpc-error" | "error" => pending = Some(Pending::new(Severity::Error)),
                    "warning" => pending = Some(Pending::new(Severity::Warning)),
                    "configuration-output" => {
                        reply.output.push_str(dump::START_MARKER);
                        reply.output.push('\n');
                    }
                    _ => {}
                }
                stack.push(name);
            }
            Event::Empty(start) => {
                if start.local_name().as_ref() == b"rpc-reply" {
                    message_id = attribute(&start, "message-id");
                }
            }
            Event::End(_) => {
                let Some(name) = stack.pop() else {
                    continue;
                };
                match name.as_str() {
                    "rpc-error" | "error" | "warning" => {
                        if let Some(done) = pending.take() {
                            done.finish(&mut reply);
                        }
                    }
                    "configuration-output" => {
                        if !reply.output.ends_with('\n') {
                            reply.output.push('\n');
                        }
                        reply.output.push_str(dump::END_MARKER);
                        reply.output.push('\n');
                    }
                    _ => {}
                }
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| SessionError::transport(format!("malformed reply text: {e}")))?;
                absorb(&stack, &text, &mut pending, &mut reply);
            }
            Event::CData(data) => {
                let text = String::from_utf8_lossy(&data).into_owned();
                absorb(&stack, &text, &mut pending, &mut reply);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok((message_id, reply))
}

fn absorb(stack: &[String], text: &str, pending: &mut Option<Pending>, reply: &mut RpcReply) {
    let Some(element) = stack.last() else {
        return;
    };
    match (element.as_str(), pending.as_mut()) {
        ("output" | "configuration-output" | "configuration-text", _) => {
            reply.output.push_str(text);
        }
        ("error-message" | "message", Some(p)) => {
            if !p.message.is_empty() {
                p.message.push(' ');
            }
            p.message.push_str(text.trim());
        }
        ("error-severity", Some(p)) => {
            p.severity = if text.trim() == "warning" {
                Severity::Warning
            } else {
                Severity::Error
            };
        }
        ("bad-element", Some(p)) => p.element = Some(text.trim().to_string()),
        ("error-path", Some(p)) => p.path = Some(text.trim().to_string()),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_take_message_splits_frames() {
        let mut buffer = b"<hello/>]]>]]>\n<rpc-reply message-id=\"1\"><ok/></rpc-reply>]]>]]><rpc-re"
            .to_vec();
        assert_eq!(take_message(&mut buffer).as_deref(), Some("<hello/>"));
        assert_eq!(
            take_message(&mut buffer).as_deref(),
            Some("<rpc-reply message-id=\"1\"><ok/></rpc-reply>")
        );
        assert_eq!(take_message(&mut buffer), None);
        assert_eq!(buffer, b"<rpc-re".to_vec());
    }

    #[test]
    fn test_parse_ok_reply() {
        let (id, reply) =
            parse_reply(r#"<rpc-reply xmlns="urn:ietf:params:xml:ns:netconf:base:1.0" message-id="7"><ok/></rpc-reply>"#)
                .unwrap();
        assert_eq!(id.as_deref(), Some("7"));
        assert!(reply.is_ok());
        assert!(reply.warnings.is_empty());
    }

    #[test]
    fn test_parse_configuration_output() {
        let xml = r#"<rpc-reply message-id="3">
<configuration-information>
<configuration-output>
set applications application testacc protocol tcp
set applications application testacc destination-port 80
</configuration-output>
</configuration-information>
</rpc-reply>"#;
        let (_, reply) = parse_reply(xml).unwrap();
        assert_eq!(
            dump::set_lines(&reply.output),
            vec![
                "applications application testacc protocol tcp",
                "applications application testacc destination-port 80"
            ]
        );
    }

    #[test]
    fn test_parse_errors_and_warnings() {
        let xml = r#"<rpc-reply message-id="4">
<load-configuration-results>
<rpc-error>
<error-severity>warning</error-severity>
<error-message>statement not found</error-message>
</rpc-error>
<rpc-error>
<error-type>protocol</error-type>
<error-severity>error</error-severity>
<error-path>[edit applications application web]</error-path>
<error-info><bad-element>bogus</bad-element></error-info>
<error-message>syntax error</error-message>
</rpc-error>
<load-error-count>1</load-error-count>
</load-configuration-results>
</rpc-reply>"#;
        let (_, reply) = parse_reply(xml).unwrap();
        assert_eq!(
            reply.errors,
            vec![RpcMessage::new("syntax error")
                .at("[edit applications application web]")
                .with_element("bogus")]
        );
        assert_eq!(reply.warnings, vec![RpcMessage::new("statement not found")]);
    }

    #[test]
    fn test_parse_xnm_error() {
        let xml = r#"<rpc-reply message-id="5"><xnm:error xmlns:xnm="http://xml.juniper.net/xnm/1.1/xnm"><message>
syntax error, expecting &lt;command&gt;
</message></xnm:error></rpc-reply>"#;
        let (_, reply) = parse_reply(xml).unwrap();
        assert_eq!(reply.error_text(), "syntax error, expecting <command>");
    }

    #[test]
    fn test_rpc_bodies_escape_text() {
        let body = rpc_body(&Rpc::LoadSet {
            lines: vec![
                "set system login message \"a & b\"".to_string(),
                "set system host-name r1".to_string(),
            ],
        });
        assert!(body.contains("a &amp; b"));
        assert!(body.contains("\nset system host-name r1"));
        assert_eq!(
            rpc_body(&Rpc::Command {
                command: "show configuration | display set".to_string()
            }),
            r#"<command format="text">show configuration | display set</command>"#
        );
        assert_eq!(rpc_body(&Rpc::Close), "<close-session/>");
        assert_eq!(rpc_body(&Rpc::Discard), "<discard-changes/>");
    }
}
