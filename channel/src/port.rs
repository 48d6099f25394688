//! Channel transport: host process connection and the live port.
//!
//! A [`Port`] is one live channel instance: the writer half of the pipe,
//! the spawned host process (when there is one), and a background reader
//! task that decodes frames and drives the bound [`ChannelObserver`]. The
//! connection itself comes from a [`HostConnector`], which is a trait so
//! tests can swap the spawned process for an in-memory pipe.

use crate::error::{ChannelError, ChannelResult};
use crate::frame;
use crate::manifest::HostManifest;
use crate::observer::{ChannelObserver, DisconnectReason};
use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

/// The two pipe halves of a freshly opened connection, plus the child
/// process handle when the connector spawned one.
pub struct HostIo {
    /// Host-to-client stream (the host's stdout)
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
    /// Client-to-host stream (the host's stdin)
    pub writer: Box<dyn AsyncWrite + Send + Unpin>,
    /// Spawned host process, if any
    pub child: Option<Child>,
}

impl HostIo {
    /// Tear down a connection that never became a port.
    pub(crate) fn discard(mut self) {
        if let Some(child) = self.child.as_mut() {
            let _ = child.start_kill();
        }
    }
}

/// Connection factory for a resolved host manifest.
#[async_trait]
pub trait HostConnector: Send + Sync + 'static {
    /// Open a fresh connection to the host the manifest describes.
    async fn connect(&self, manifest: &HostManifest) -> ChannelResult<HostIo>;
}

/// Connector that launches the manifest's executable with piped stdio,
/// the way a browser starts a native messaging host.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessConnector;

#[async_trait]
impl HostConnector for ProcessConnector {
    async fn connect(&self, manifest: &HostManifest) -> ChannelResult<HostIo> {
        let mut command = Command::new(&manifest.path);
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            // Host stderr flows through to ours, as it does under Firefox
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        // Browsers pass the manifest location as the first argument
        if let Some(source) = &manifest.source {
            command.arg(source);
        }

        let mut child = command.spawn().map_err(|e| ChannelError::Spawn {
            host: manifest.name.clone(),
            source: e,
        })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            ChannelError::protocol("Spawned host has no stdin handle")
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            ChannelError::protocol("Spawned host has no stdout handle")
        })?;

        tracing::debug!(
            host = %manifest.name,
            path = %manifest.path.display(),
            pid = child.id(),
            "Spawned native host process"
        );

        Ok(HostIo {
            reader: Box::new(stdout),
            writer: Box::new(stdin),
            child: Some(child),
        })
    }
}

/// Callback invoked exactly once when a port's reader task stops.
pub(crate) type StopHook = Box<dyn FnOnce(u64, DisconnectReason) + Send>;

/// One live channel instance.
///
/// The bound observer is owned by the reader task and dropped when the
/// task ends, so the message and disconnect handlers of a dead port are
/// released together and can never fire for a successor port.
pub(crate) struct Port {
    generation: u64,
    max_message_size: usize,
    writer: tokio::sync::Mutex<Box<dyn AsyncWrite + Send + Unpin>>,
    child: Option<Child>,
    reader_task: JoinHandle<()>,
}

impl Port {
    /// Bind an observer to a fresh connection and start its reader task.
    ///
    /// The observer is fully bound before this returns, so no message can
    /// race ahead of handler setup.
    pub(crate) fn open(
        io: HostIo,
        generation: u64,
        max_message_size: usize,
        observer: Arc<dyn ChannelObserver>,
        on_stopped: StopHook,
    ) -> Self {
        let HostIo {
            mut reader,
            writer,
            child,
        } = io;

        let reader_task = tokio::spawn(async move {
            let reason = loop {
                match frame::read_frame(&mut reader, max_message_size).await {
                    Ok(Some(payload)) => observer.on_message(&payload),
                    Ok(None) => break DisconnectReason::PeerClosed,
                    Err(ChannelError::Protocol(detail)) => {
                        break DisconnectReason::Protocol(detail)
                    }
                    Err(e) => break DisconnectReason::Io(e.to_string()),
                }
            };
            observer.on_disconnect(&reason);
            on_stopped(generation, reason);
            // observer drops here, releasing both handlers as a pair
        });

        Self {
            generation,
            max_message_size,
            writer: tokio::sync::Mutex::new(writer),
            child,
            reader_task,
        }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Write one payload onto the channel.
    pub(crate) async fn send(&self, payload: &Value) -> ChannelResult<()> {
        let mut writer = self.writer.lock().await;
        frame::write_frame(&mut *writer, payload, self.max_message_size).await
    }

    /// Close this port: stop the reader task, shut the pipe, kill the
    /// host process.
    ///
    /// # Errors
    ///
    /// Returns the first failure encountered; all teardown steps are
    /// attempted regardless.
    pub(crate) async fn close(mut self) -> ChannelResult<()> {
        // Aborting first keeps our own teardown from being reported as a
        // peer disconnect.
        self.reader_task.abort();

        let shutdown_result = self.writer.get_mut().shutdown().await;

        let mut kill_result = Ok(());
        if let Some(mut child) = self.child.take() {
            kill_result = child.kill().await;
        }

        shutdown_result?;
        kill_result?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::LogObserver;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct RecordingObserver {
        messages: Mutex<Vec<Value>>,
        disconnects: Mutex<Vec<DisconnectReason>>,
    }

    impl RecordingObserver {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                messages: Mutex::new(Vec::new()),
                disconnects: Mutex::new(Vec::new()),
            })
        }
    }

    impl ChannelObserver for RecordingObserver {
        fn on_message(&self, payload: &Value) {
            self.messages.lock().unwrap().push(payload.clone());
        }

        fn on_disconnect(&self, reason: &DisconnectReason) {
            self.disconnects.lock().unwrap().push(reason.clone());
        }
    }

    fn duplex_io() -> (HostIo, tokio::io::DuplexStream, tokio::io::DuplexStream) {
        let (client_reader, host_writer) = tokio::io::duplex(64 * 1024);
        let (host_reader, client_writer) = tokio::io::duplex(64 * 1024);
        let io = HostIo {
            reader: Box::new(client_reader),
            writer: Box::new(client_writer),
            child: None,
        };
        (io, host_writer, host_reader)
    }

    #[tokio::test]
    async fn test_port_delivers_messages_to_observer() {
        let (io, mut host_writer, _host_reader) = duplex_io();
        let observer = RecordingObserver::new();
        let stopped = Arc::new(AtomicUsize::new(0));
        let stopped_clone = Arc::clone(&stopped);

        let port = Port::open(
            io,
            1,
            1_048_576,
            observer.clone(),
            Box::new(move |_, _| {
                stopped_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let payload = json!({"status": "ok"});
        crate::frame::write_frame(&mut host_writer, &payload, 1_048_576)
            .await
            .unwrap();

        // Drop the host's write end: observer sees the message, then a
        // clean peer disconnect.
        drop(host_writer);
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        assert_eq!(observer.messages.lock().unwrap().as_slice(), &[payload]);
        assert_eq!(
            observer.disconnects.lock().unwrap().as_slice(),
            &[DisconnectReason::PeerClosed]
        );
        assert_eq!(stopped.load(Ordering::SeqCst), 1);

        drop(port);
    }

    #[tokio::test]
    async fn test_port_send_reaches_host() {
        let (io, _host_writer, mut host_reader) = duplex_io();
        let port = Port::open(
            io,
            1,
            1_048_576,
            Arc::new(LogObserver),
            Box::new(|_, _| {}),
        );

        port.send(&Value::String("dostuff ytdl.exe https://example.com/x".to_string()))
            .await
            .unwrap();

        let received = crate::frame::read_frame(&mut host_reader, 1_048_576)
            .await
            .unwrap();
        assert_eq!(
            received,
            Some(Value::String(
                "dostuff ytdl.exe https://example.com/x".to_string()
            ))
        );

        port.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_port_reports_protocol_disconnect() {
        let (io, mut host_writer, _host_reader) = duplex_io();
        let observer = RecordingObserver::new();
        let _port = Port::open(io, 1, 1_048_576, observer.clone(), Box::new(|_, _| {}));

        // A zero-length frame is a protocol violation.
        host_writer.write_all(&0u32.to_le_bytes()).await.unwrap();
        host_writer.flush().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let disconnects = observer.disconnects.lock().unwrap();
        assert_eq!(disconnects.len(), 1);
        assert_eq!(disconnects[0].name(), "Protocol");
    }

    #[tokio::test]
    async fn test_close_suppresses_disconnect_notification() {
        let (io, _host_writer, _host_reader) = duplex_io();
        let observer = RecordingObserver::new();
        let stopped = Arc::new(AtomicUsize::new(0));
        let stopped_clone = Arc::clone(&stopped);

        let port = Port::open(
            io,
            1,
            1_048_576,
            observer.clone(),
            Box::new(move |_, _| {
                stopped_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );

        port.close().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        assert!(observer.disconnects.lock().unwrap().is_empty());
        assert_eq!(stopped.load(Ordering::SeqCst), 0);
    }
}
