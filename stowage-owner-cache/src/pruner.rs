// Copyright 2026 stowage Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{sync::Weak, time::Duration};

use stowage_common::error::{Error, Result};

/// A target the [`Pruner`] can sweep.
pub(crate) trait Prune: Send + Sync + 'static {
    /// Remove dead entries and return how many were removed.
    fn prune(&self) -> Result<usize>;
}

/// Background thread that prunes its target periodically.
///
/// The thread holds the target weakly and exits when the target is gone or the [`Pruner`] is dropped.
#[derive(Debug)]
pub(crate) struct Pruner {
    _stop: flume::Sender<()>,
}

impl Pruner {
    pub(crate) fn spawn<P: Prune>(target: Weak<P>, interval: Duration) -> Result<Self> {
        let (tx, rx) = flume::bounded(1);
        std::thread::Builder::new()
            .name("stowage-pruner".to_string())
            .spawn(move || Self::run(target, rx, interval))
            .map_err(Error::io)?;
        Ok(Self { _stop: tx })
    }

    fn run<P: Prune>(target: Weak<P>, stop: flume::Receiver<()>, interval: Duration) {
        loop {
            match stop.recv_timeout(interval) {
                Err(flume::RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(flume::RecvTimeoutError::Disconnected) => break,
            }
            let Some(target) = target.upgrade() else { break };
            match target.prune() {
                Ok(0) => {}
                Ok(removed) => tracing::debug!("[pruner]: removed {} dead entries", removed),
                Err(e) => tracing::warn!("[pruner]: prune failed: {}", e),
            }
        }
        tracing::trace!("[pruner]: exit");
    }
}
