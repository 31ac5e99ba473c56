//! CSV sinks for the received- and sent-packet logs. One sink per file,
//! each line-atomic under its own lock.

use crate::impairment::Direction;
use crate::packet::Packet;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;

const HEADER: &str = "timestamp_ms,direction,seq,ack,flags,payload_len\n";

fn direction_label(direction: Direction) -> &'static str {
    match direction {
        Direction::ClientToServer => "client_to_server",
        Direction::ServerToClient => "server_to_client",
    }
}

fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

/// An append-only, header-once CSV file guarded by an async mutex so writes
/// from concurrent pipelines and delay tasks never interleave mid-line.
#[derive(Debug)]
pub struct CsvSink {
    writer: Mutex<BufWriter<File>>,
}

impl CsvSink {
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let is_new = !path.exists();
        let file = tokio::fs::OpenOptions::new().create(true).append(true).open(path).await?;
        let mut writer = BufWriter::new(file);
        if is_new {
            writer.write_all(HEADER.as_bytes()).await?;
            writer.flush().await?;
        }
        Ok(Self { writer: Mutex::new(writer) })
    }

    pub async fn log(&self, direction: Direction, packet: &Packet) -> std::io::Result<()> {
        let line = format!(
            "{},{},{},{},{},{}\n",
            now_ms(),
            direction_label(direction),
            packet.seq_number,
            packet.ack_number,
            packet.flags,
            packet.effective_len(),
        );
        let mut writer = self.writer.lock().await;
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::flags::PSHACK;

    #[tokio::test]
    async fn writes_header_once_and_one_line_per_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("received.csv");

        let sink = CsvSink::open(&path).await.unwrap();
        let packet = Packet::new(10, 20, PSHACK, 4, b"hi");
        sink.log(Direction::ClientToServer, &packet).await.unwrap();
        sink.log(Direction::ServerToClient, &packet).await.unwrap();
        drop(sink);

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next().unwrap(), HEADER.trim_end());
        assert!(lines.next().unwrap().contains("client_to_server"));
        assert!(lines.next().unwrap().contains("server_to_client"));
        assert!(lines.next().is_none());
    }

    #[tokio::test]
    async fn reopening_an_existing_file_does_not_duplicate_the_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sent.csv");

        let sink = CsvSink::open(&path).await.unwrap();
        let packet = Packet::new(1, 1, PSHACK, 4, b"x");
        sink.log(Direction::ClientToServer, &packet).await.unwrap();
        drop(sink);

        let sink = CsvSink::open(&path).await.unwrap();
        sink.log(Direction::ClientToServer, &packet).await.unwrap();
        drop(sink);

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents.matches("timestamp_ms").count(), 1);
    }
}
