//! End-to-end upload against a simulated device behind the notification transport.

use std::io;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use ysled::codec::chunk::CHUNK_HEADER_SIZE;
use ysled::codec::{
    CHUNK_PAYLOAD_SIZE, ChunkHeader, build_ready, build_reset, build_upload_complete,
};
use ysled::{
    LedClient, NotificationSender, NotifyTransport, PacketSink, ProtocolError, SessionConfig,
};

/// Device model: reassembles chunk payloads and acknowledges them unless told to drop.
#[derive(Clone, Default)]
struct SimulatedDevice {
    state: Arc<Mutex<DeviceState>>,
}

#[derive(Default)]
struct DeviceState {
    notifier: Option<NotificationSender>,
    received: Vec<Vec<u8>>,
    payload: Vec<u8>,
    drop_acks_for: Vec<u16>,
    commits: usize,
}

#[async_trait::async_trait]
impl PacketSink for SimulatedDevice {
    async fn write_raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut state = self.state.lock().map_err(|_| io::Error::other("device poisoned"))?;
        state.received.push(bytes.to_vec());

        if bytes == build_upload_complete().as_bytes() {
            state.commits += 1;
        } else if bytes == build_reset().as_bytes() {
            state.payload.clear();
        } else if let Some(header) = ChunkHeader::parse(bytes) {
            state.payload.extend_from_slice(&bytes[CHUNK_HEADER_SIZE..CHUNK_HEADER_SIZE + CHUNK_PAYLOAD_SIZE]);
            if !state.drop_acks_for.contains(&header.index) {
                if let Some(notifier) = &state.notifier {
                    notifier.notify(&[0x00, header.index as u8]);
                }
            }
        }
        Ok(())
    }
}

fn connect(device: &SimulatedDevice, config: SessionConfig) -> LedClient<NotifyTransport<SimulatedDevice>> {
    let (transport, notifier) = NotifyTransport::new(device.clone(), config.write_delay);
    device.state.lock().unwrap().notifier = Some(notifier);
    LedClient::new(transport, config)
}

fn container(len: usize) -> Vec<u8> {
    let mut blob = b"GIF89a".to_vec();
    blob.extend((0..len - 6).map(|i| (i * 7 % 256) as u8));
    blob
}

#[tokio::test(start_paused = true)]
async fn device_reassembles_uploaded_container() -> Result<()> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let device = SimulatedDevice::default();
    let mut client = connect(&device, SessionConfig::default());
    let blob = container(1000);

    let report = client.upload(&blob, &CancellationToken::new()).await.context("upload")?;

    assert_eq!(report.total_chunks, 6);
    assert_eq!(report.acked, 6);
    assert!(report.fully_acked());

    let state = device.state.lock().unwrap();
    assert_eq!(&state.payload[..blob.len()], &blob[..]);
    assert!(state.payload[blob.len()..].iter().all(|&b| b == 0));
    assert_eq!(state.commits, 2);
    assert_eq!(state.received[0], build_reset().as_bytes());
    assert_eq!(state.received[1], build_ready().as_bytes());
    assert_eq!(state.received.len(), 6 + 4);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn dropped_acks_delay_but_do_not_abort() -> Result<()> {
    let device = SimulatedDevice::default();
    device.state.lock().unwrap().drop_acks_for = vec![1, 3];
    let mut client = connect(&device, SessionConfig::default());

    let report = client.upload(&container(900), &CancellationToken::new()).await?;

    assert_eq!(report.total_chunks, 5);
    assert_eq!(report.timed_out, vec![1, 3]);
    assert_eq!(report.acked, 3);
    assert!(report.elapsed >= SessionConfig::default().ack_timeout * 2);
    assert_eq!(device.state.lock().unwrap().commits, 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn strict_acks_stop_before_commit() -> Result<()> {
    let device = SimulatedDevice::default();
    device.state.lock().unwrap().drop_acks_for = vec![2];
    let config = SessionConfig::from_yaml_str("strict_acks: true\nack_timeout_ms: 300\n")?;
    let mut client = connect(&device, config);

    let err = client.upload(&container(900), &CancellationToken::new()).await.unwrap_err();

    assert!(matches!(err, ProtocolError::AckTimeout { chunk: 2, .. }), "{err:?}");
    let state = device.state.lock().unwrap();
    assert_eq!(state.commits, 0);
    assert_eq!(state.received.len(), 2 + 3);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn oversized_container_is_rejected_before_any_write() -> Result<()> {
    let device = SimulatedDevice::default();
    let mut client = connect(&device, SessionConfig::default());

    let err = client.upload(&vec![0u8; 255 * CHUNK_PAYLOAD_SIZE + 1], &CancellationToken::new()).await;

    assert!(matches!(err, Err(ProtocolError::TooManyChunks { chunks: 256, max: 255 })));
    assert!(device.state.lock().unwrap().received.is_empty());
    Ok(())
}
