//! Local transport carrying file descriptors alongside byte payloads
//!
//! Clients hand buffers and synchronization primitives to the display server as file
//! descriptors, passed over a connected unix stream socket. The functions of this
//! module implement this on top of the kernel's `SCM_RIGHTS` mechanism:
//!
//! - [`send_fds`] sends a set of descriptors as a single control message,
//! - [`receive_data`] reads an exact number of bytes and descriptors,
//! - [`Channel`] wraps a socket and combines both into framed messages.
//!
//! All operations are blocking. A channel has no internal locking: at most one
//! thread may receive on it at a time, and at most one may send, as concurrent
//! calls would interleave their framing.

use std::os::unix::{
    io::{AsFd, BorrowedFd, OwnedFd},
    net::UnixStream,
};

use rustix::io::Errno;
use tracing::debug;

mod ancillary;

pub use self::ancillary::{receive_data, send_fds};

/// Errors of the transport
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// A reception of zero bytes was requested
    #[error("requested to receive zero bytes")]
    ZeroLengthRequest,
    /// The peer closed the connection
    #[error("peer disconnected")]
    Disconnected(#[source] Option<Errno>),
    /// The underlying socket reported an error
    #[error("socket error")]
    Socket(#[source] Errno),
    /// A control message of an unexpected kind was received, or could not be built
    #[error("invalid control message")]
    InvalidControlMessage,
    /// Descriptors arrived attached to something else than the payload of [`send_fds`]
    #[error("descriptors arrived with the unexpected payload {0:?}")]
    UnexpectedFdPayload([u8; 2]),
    /// More descriptors arrived than were expected
    #[error("received more file descriptors than expected")]
    TooManyFds,
    /// All bytes arrived but some descriptors did not
    #[error("received fewer file descriptors than expected ({received} out of {expected})")]
    TooFewFds {
        /// Number of descriptors that were expected
        expected: usize,
        /// Number of descriptors that actually arrived
        received: usize,
    },
}

impl TransportError {
    /// Whether this error means the connection is gone for good
    pub fn is_disconnect(&self) -> bool {
        matches!(self, TransportError::Disconnected(_))
    }
}

/// One end of a connected local stream socket
///
/// A message sent through [`Channel::send`] is the payload followed, if any
/// descriptors are attached, by the fixed payload of [`send_fds`] carrying them.
/// [`Channel::receive`] reads back exactly that shape, so both ends have to agree
/// beforehand on the payload length and the number of descriptors.
#[derive(Debug)]
pub struct Channel {
    stream: UnixStream,
}

impl Channel {
    /// Wrap a connected stream socket
    pub fn new(stream: UnixStream) -> Channel {
        Channel { stream }
    }

    /// Create a pair of channels connected to each other
    pub fn pair() -> std::io::Result<(Channel, Channel)> {
        let (a, b) = UnixStream::pair()?;
        Ok((Channel::new(a), Channel::new(b)))
    }

    /// Access the underlying socket
    pub fn stream(&self) -> &UnixStream {
        &self.stream
    }

    /// Take back the underlying socket
    pub fn into_inner(self) -> UnixStream {
        self.stream
    }

    /// Send a payload with some descriptors attached
    ///
    /// The descriptors are duplicated into the peer, the caller keeps its own copies.
    pub fn send(&self, bytes: &[u8], fds: &[BorrowedFd<'_>]) -> Result<(), TransportError> {
        ancillary::send_all(&self.stream, bytes)?;
        self.send_fds(fds)?;
        debug!(bytes = bytes.len(), fds = fds.len(), "Sent message");
        Ok(())
    }

    /// Receive a payload of `len` bytes with `fd_count` descriptors attached
    ///
    /// Fails with [`TransportError::ZeroLengthRequest`] if there is nothing to receive,
    /// and with [`TransportError::UnexpectedFdPayload`] if the descriptors were not
    /// sent through [`send_fds`].
    pub fn receive(&self, len: usize, fd_count: usize) -> Result<(Vec<u8>, Vec<OwnedFd>), TransportError> {
        if len == 0 && fd_count == 0 {
            return Err(TransportError::ZeroLengthRequest);
        }

        let mut bytes = vec![0; len];
        if len > 0 {
            self.receive_data(&mut bytes, 0)?;
        }
        let fds = if fd_count > 0 {
            let mut payload = *ancillary::FD_PAYLOAD;
            let fds = self.receive_data(&mut payload, fd_count)?;
            if &payload != ancillary::FD_PAYLOAD {
                debug!(?payload, "Unexpected descriptor payload");
                return Err(TransportError::UnexpectedFdPayload(payload));
            }
            fds
        } else {
            Vec::new()
        };

        debug!(bytes = len, fds = fds.len(), "Received message");
        Ok((bytes, fds))
    }

    /// Send descriptors only, see [`send_fds`]
    pub fn send_fds(&self, fds: &[BorrowedFd<'_>]) -> Result<(), TransportError> {
        send_fds(&self.stream, fds)
    }

    /// Receive raw bytes and descriptors, see [`receive_data`]
    pub fn receive_data(&self, buffer: &mut [u8], fd_count: usize) -> Result<Vec<OwnedFd>, TransportError> {
        receive_data(&self.stream, buffer, fd_count)
    }
}

impl AsFd for Channel {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.stream.as_fd()
    }
}

impl From<UnixStream> for Channel {
    fn from(stream: UnixStream) -> Channel {
        Channel::new(stream)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        fs::File,
        io::{Read, Seek, SeekFrom, Write},
    };

    use super::*;

    #[test]
    fn message_round_trip() {
        let (client, server) = Channel::pair().unwrap();
        let mut files = Vec::new();
        for contents in [&b"buffer"[..], b"fence"] {
            let mut file = tempfile::tempfile().unwrap();
            file.write_all(contents).unwrap();
            files.push(file);
        }

        client
            .send(b"hi", &[files[0].as_fd(), files[1].as_fd()])
            .unwrap();
        drop(files);

        let (bytes, fds) = server.receive(2, 2).unwrap();
        assert_eq!(bytes, b"hi");
        assert_eq!(fds.len(), 2);
        for (fd, expected) in fds.into_iter().zip([&b"buffer"[..], b"fence"]) {
            let mut file = File::from(fd);
            file.seek(SeekFrom::Start(0)).unwrap();
            let mut contents = Vec::new();
            file.read_to_end(&mut contents).unwrap();
            assert_eq!(contents, expected);
        }
    }

    #[test]
    fn payload_without_descriptors() {
        let (client, server) = Channel::pair().unwrap();
        client.send(b"hello", &[]).unwrap();
        client.send(b"!", &[]).unwrap();

        assert_eq!(server.receive(5, 0).unwrap().0, b"hello");
        assert_eq!(server.receive(1, 0).unwrap().0, b"!");
    }

    #[test]
    fn descriptors_without_payload() {
        let (client, server) = Channel::pair().unwrap();
        let file = tempfile::tempfile().unwrap();
        client.send(&[], &[file.as_fd()]).unwrap();

        let (bytes, fds) = server.receive(0, 1).unwrap();
        assert!(bytes.is_empty());
        assert_eq!(fds.len(), 1);
    }

    #[test]
    fn descriptors_with_a_foreign_payload_are_rejected() {
        use rustix::net::{sendmsg, SendAncillaryBuffer, SendAncillaryMessage, SendFlags};
        use std::io::IoSlice;

        let (client, server) = Channel::pair().unwrap();
        let file = tempfile::tempfile().unwrap();
        let fds = [file.as_fd()];
        let mut space = vec![0; rustix::cmsg_space!(ScmRights(1))];
        let mut control = SendAncillaryBuffer::new(&mut space);
        assert!(control.push(SendAncillaryMessage::ScmRights(&fds)));
        let sent = sendmsg(client.stream(), &[IoSlice::new(b"XY")], &mut control, SendFlags::empty()).unwrap();
        assert_eq!(sent, 2);

        let err = server.receive(0, 1).unwrap_err();
        assert!(matches!(err, TransportError::UnexpectedFdPayload(payload) if &payload == b"XY"));
    }

    #[test]
    fn empty_receive_is_a_logic_error() {
        let (_client, server) = Channel::pair().unwrap();
        assert!(matches!(server.receive(0, 0), Err(TransportError::ZeroLengthRequest)));
    }
}
