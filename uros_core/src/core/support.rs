//! Support bundle: init options, context and the default allocator.

use crate::communication::{LocalTransport, Transport};
use crate::core::clock::{Clock, SteadyClock};
use crate::error::{UrosError, UrosResult};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Highest domain id accepted by [`InitOptions`]
pub const MAX_DOMAIN_ID: usize = 232;

/// Default allocator handed to the support and executor.
///
/// Rust's global allocator does the actual work; this handle performs
/// fallible up-front reservations and keeps a running total so a constrained
/// target can check how much was claimed during setup.
#[derive(Debug, Clone, Default)]
pub struct Allocator {
    reserved_bytes: Arc<AtomicUsize>,
}

impl Allocator {
    pub fn default_allocator() -> Self {
        Self::default()
    }

    /// Reserve room for exactly `capacity` values of `T`
    pub fn reserve<T>(&self, capacity: usize) -> UrosResult<Vec<T>> {
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(capacity)
            .map_err(|e| UrosError::BadAlloc(e.to_string()))?;
        self.reserved_bytes.fetch_add(
            capacity.saturating_mul(std::mem::size_of::<T>()),
            Ordering::Relaxed,
        );
        Ok(buffer)
    }

    /// Total bytes reserved through this allocator (and its clones)
    pub fn reserved_bytes(&self) -> usize {
        self.reserved_bytes.load(Ordering::Relaxed)
    }
}

/// Options consumed by [`Support::init`]
#[derive(Clone, Default)]
pub struct InitOptions {
    domain_id: usize,
    transport: Option<Arc<dyn Transport>>,
    clock: Option<Arc<dyn Clock>>,
}

impl InitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_domain_id(mut self, domain_id: usize) -> Self {
        self.domain_id = domain_id;
        self
    }

    /// Share an existing transport (several supports can talk over one bus)
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn domain_id(&self) -> usize {
        self.domain_id
    }
}

impl fmt::Debug for InitOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitOptions")
            .field("domain_id", &self.domain_id)
            .field("custom_transport", &self.transport.is_some())
            .field("custom_clock", &self.clock.is_some())
            .finish()
    }
}

struct ContextInner {
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    domain_id: usize,
    instance_id: Uuid,
    valid: AtomicBool,
}

/// Shared handle to the transport and clock of one initialized support.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Context {
    pub fn is_valid(&self) -> bool {
        self.inner.valid.load(Ordering::Acquire)
    }

    /// Fails with [`UrosError::NotInit`] once the context was shut down
    pub fn ensure_valid(&self) -> UrosResult<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(UrosError::NotInit)
        }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.inner.transport
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.inner.clock
    }

    pub fn domain_id(&self) -> usize {
        self.inner.domain_id
    }

    pub fn instance_id(&self) -> Uuid {
        self.inner.instance_id
    }

    /// Invalidate the context. Executors stop dispatching and new endpoints
    /// can no longer be created.
    pub fn shutdown(&self) -> UrosResult<()> {
        if self.inner.valid.swap(false, Ordering::AcqRel) {
            log::debug!("context {} shut down", self.inner.instance_id);
            Ok(())
        } else {
            Err(UrosError::AlreadyShutdown)
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("instance_id", &self.inner.instance_id)
            .field("domain_id", &self.inner.domain_id)
            .field("valid", &self.is_valid())
            .finish_non_exhaustive()
    }
}

/// Init bundle every node, timer and executor is created from.
#[derive(Debug)]
pub struct Support {
    context: Context,
    allocator: Allocator,
}

impl Support {
    /// Initialize the context. A fresh [`LocalTransport`] and
    /// [`SteadyClock`] are used unless the options provide their own.
    pub fn init(options: InitOptions, allocator: &Allocator) -> UrosResult<Self> {
        if options.domain_id > MAX_DOMAIN_ID {
            return Err(UrosError::invalid_argument(format!(
                "domain id {} exceeds {}",
                options.domain_id, MAX_DOMAIN_ID
            )));
        }

        let transport = options
            .transport
            .unwrap_or_else(|| Arc::new(LocalTransport::new()));
        let clock = options
            .clock
            .unwrap_or_else(|| Arc::new(SteadyClock::new()));

        let context = Context {
            inner: Arc::new(ContextInner {
                transport,
                clock,
                domain_id: options.domain_id,
                instance_id: Uuid::new_v4(),
                valid: AtomicBool::new(true),
            }),
        };

        log::info!(
            "support initialized (domain {}, context {})",
            context.domain_id(),
            context.instance_id()
        );

        Ok(Self {
            context,
            allocator: allocator.clone(),
        })
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        self.context.clock()
    }

    pub fn allocator(&self) -> &Allocator {
        &self.allocator
    }

    /// Shut the context down if it is still valid.
    pub fn fini(self) -> UrosResult<()> {
        if self.context.is_valid() {
            self.context.shutdown()?;
        }
        Ok(())
    }
}
