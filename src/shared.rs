use std::io::{Read, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use serialport::SerialPort;

use crate::channel::{Channel, Filter};
use crate::device::LightEngine;
use crate::error::Result;

/// Cloneable handle to one [`LightEngine`] for use from several threads.
///
/// Every call holds the lock for the whole request, so register updates and
/// frames from different callers never interleave.
pub struct SharedLightEngine<T: Read + Write = Box<dyn SerialPort>> {
    inner: Arc<Mutex<LightEngine<T>>>,
}

impl<T: Read + Write> Clone for SharedLightEngine<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Read + Write> SharedLightEngine<T> {
    pub fn new(engine: LightEngine<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LightEngine<T>> {
        // a panic mid-call cannot leave the shadow register ahead of the
        // device, so a poisoned lock is still usable
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_open(&self) -> bool {
        self.lock().is_open()
    }

    pub fn enable_register(&self) -> u8 {
        self.lock().enable_register()
    }

    pub fn is_enabled(&self, channel: Channel) -> bool {
        self.lock().is_enabled(channel)
    }

    pub fn filter_position(&self) -> Filter {
        self.lock().filter_position()
    }

    pub fn disable_all(&self) -> Result<()> {
        self.lock().disable_all()
    }

    pub fn toggle(&self, channels: &[Channel]) -> Result<()> {
        self.lock().toggle(channels)
    }

    pub fn toggle_named<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        self.lock().toggle_named(names)
    }

    pub fn set_intensity(&self, channels: &[Channel], level: u8) -> Result<()> {
        self.lock().set_intensity(channels, level)
    }

    pub fn set_intensity_named<S: AsRef<str>>(&self, names: &[S], level: u8) -> Result<()> {
        self.lock().set_intensity_named(names, level)
    }

    pub fn temperature(&self) -> Result<f32> {
        self.lock().temperature()
    }

    pub fn close(&self) -> Result<()> {
        self.lock().close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::tests::MockPort;
    use crate::error::Error;
    use std::thread;

    #[test]
    fn concurrent_toggles_do_not_lose_updates() {
        let mock = MockPort::default();
        let shared = SharedLightEngine::new(LightEngine::connect(mock.clone()).unwrap());

        let handles: Vec<_> = Channel::ALL
            .iter()
            .map(|&channel| {
                let engine = shared.clone();
                thread::spawn(move || {
                    for _ in 0..3 {
                        engine.toggle(&[channel]).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // every channel flipped an odd number of times
        assert_eq!(shared.enable_register(), 0x00);
        for frame in mock.frames() {
            assert_eq!(frame.last(), Some(&0x50));
        }
    }

    #[test]
    fn close_through_any_clone() {
        let mock = MockPort::default();
        let shared = SharedLightEngine::new(LightEngine::connect(mock).unwrap());
        let other = shared.clone();
        other.close().unwrap();
        assert!(!shared.is_open());
        assert!(matches!(shared.temperature(), Err(Error::Closed)));
    }
}
