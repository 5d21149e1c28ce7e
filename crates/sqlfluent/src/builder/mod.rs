//! The executing builder.
//!
//! A [`Builder`] owns a driver, a cache store and one statement's worth of
//! [`QueryState`]. Fluent calls accumulate intent; a terminal call compiles it,
//! runs it and clears the state, success or failure.
//!
//! ```ignore
//! let mut db = Builder::new(driver);
//! let rows = db
//!     .table("users")
//!     .where_("status", "=", "active")
//!     .and("role", "=", "admin")
//!     .select()?;
//! ```

mod exec;

pub use exec::Fetched;

use crate::cache::{CacheStore, NoCache};
use crate::config::{BuilderConfig, ResultShape};
use crate::dialect::Dialect;
use crate::driver::Driver;
use crate::error::{SqlError, SqlResult};
use crate::explain::Explain;
use crate::fluent::Fluent;
use crate::statement::QueryState;

/// Lifecycle of the builder's current statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Nothing accumulated.
    #[default]
    Idle,
    /// Fluent calls are accumulating intent.
    Configuring,
    /// A terminal call is compiling and running the statement.
    Compiling,
    /// The driver ran the statement.
    Executed,
    /// The result came from the cache.
    Cached,
}

/// Fluent statement builder bound to a driver.
pub struct Builder<D: Driver, C: CacheStore = NoCache> {
    driver: D,
    cache: C,
    config: BuilderConfig,
    state: QueryState,
    phase: Phase,
    explained: Vec<Explain>,
}

impl<D: Driver> Builder<D, NoCache> {
    /// Create a builder with the default configuration and no cache.
    pub fn new(driver: D) -> Self {
        Self::with_config(driver, BuilderConfig::default())
    }

    pub fn with_config(driver: D, config: BuilderConfig) -> Self {
        Self {
            driver,
            cache: NoCache,
            config,
            state: QueryState::new(),
            phase: Phase::Idle,
            explained: Vec::new(),
        }
    }
}

impl<D: Driver, C: CacheStore> Builder<D, C> {
    /// Attach a cache store for `cache()` reads.
    pub fn with_cache<C2: CacheStore>(self, cache: C2) -> Builder<D, C2> {
        Builder {
            driver: self.driver,
            cache,
            config: self.config,
            state: self.state,
            phase: self.phase,
            explained: self.explained,
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn cache_store(&self) -> &C {
        &self.cache
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Dialect of the attached driver.
    pub fn dialect(&self) -> SqlResult<Dialect> {
        Dialect::from_driver_name(self.driver.driver_name())
    }

    /// Override strict mode for this builder.
    pub fn strict(&mut self, strict: bool) -> &mut Self {
        self.config.strict = strict;
        self
    }

    /// Override the result shape for this builder.
    pub fn shape(&mut self, shape: ResultShape) -> &mut Self {
        self.config.shape = shape;
        self
    }

    /// Toggle dry-run explain mode: terminals record an [`Explain`] instead of executing.
    pub fn debug(&mut self, debug: bool) -> &mut Self {
        self.config.debug = debug;
        self
    }

    /// Drain the statements recorded while in debug mode, oldest first.
    pub fn take_explained(&mut self) -> Vec<Explain> {
        std::mem::take(&mut self.explained)
    }

    /// Run one terminal operation. State is cleared afterwards whatever the outcome.
    ///
    /// A builder left in [`Phase::Compiling`] (a terminal panicked) refuses further
    /// terminals until [`Fluent::reset`] is called.
    fn terminal<T>(&mut self, run: impl FnOnce(&mut Self) -> SqlResult<T>) -> SqlResult<T> {
        if self.phase == Phase::Compiling {
            return Err(SqlError::config(
                "builder was interrupted mid-statement; call reset() before reuse",
            ));
        }
        self.phase = Phase::Compiling;
        let result = run(self);
        self.state.clear();
        self.phase = Phase::Idle;
        result
    }
}

impl<D: Driver, C: CacheStore> Fluent for Builder<D, C> {
    fn state(&self) -> &QueryState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut QueryState {
        if self.phase == Phase::Idle {
            self.phase = Phase::Configuring;
        }
        &mut self.state
    }

    fn strict_mode(&self) -> bool {
        self.config.strict
    }

    fn reset(&mut self) -> &mut Self {
        self.state.clear();
        self.phase = Phase::Idle;
        self
    }
}
