//! Byte-oriented duplex channel the interface reads frames from
//!
//! The stack never creates or configures the device behind the channel.
//! A TAP [`tun_tap::Iface`] opened without packet info carries bare
//! Ethernet frames and plugs in directly.

use std::io;

use tun_tap::Iface;

/// One frame per call in each direction
pub trait FrameChannel {
    /// Block until a frame arrives; returns its length.
    fn recv(&self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write one complete frame; returns the bytes written.
    fn send(&self, frame: &[u8]) -> io::Result<usize>;
}

impl FrameChannel for Iface {
    fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        Iface::recv(self, buf)
    }

    fn send(&self, frame: &[u8]) -> io::Result<usize> {
        Iface::send(self, frame)
    }
}

impl<C: FrameChannel + ?Sized> FrameChannel for &C {
    fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).recv(buf)
    }

    fn send(&self, frame: &[u8]) -> io::Result<usize> {
        (**self).send(frame)
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use super::FrameChannel;
    use std::collections::VecDeque;
    use std::io;
    use std::sync::Mutex;

    /// Queue-backed channel; `recv` fails once the queue runs dry
    #[derive(Debug, Default)]
    pub(crate) struct MemoryChannel {
        inbound: Mutex<VecDeque<Vec<u8>>>,
        outbound: Mutex<Vec<Vec<u8>>>,
        fail_send: bool,
    }

    impl MemoryChannel {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn failing_send() -> Self {
            MemoryChannel {
                fail_send: true,
                ..Self::default()
            }
        }

        pub(crate) fn with_frames<I: IntoIterator<Item = Vec<u8>>>(frames: I) -> Self {
            let channel = Self::new();
            channel.inbound.lock().unwrap().extend(frames);
            channel
        }

        pub(crate) fn push(&self, frame: Vec<u8>) {
            self.inbound.lock().unwrap().push_back(frame);
        }

        pub(crate) fn sent(&self) -> Vec<Vec<u8>> {
            self.outbound.lock().unwrap().clone()
        }
    }

    impl FrameChannel for MemoryChannel {
        fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
            let frame = self
                .inbound
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no more frames"))?;
            let n = frame.len().min(buf.len());
            buf[..n].copy_from_slice(&frame[..n]);
            Ok(n)
        }

        fn send(&self, frame: &[u8]) -> io::Result<usize> {
            if self.fail_send {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device gone"));
            }
            self.outbound.lock().unwrap().push(frame.to_vec());
            Ok(frame.len())
        }
    }
}
