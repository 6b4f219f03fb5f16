//! Version-gated upgrade steps for a resource family.
//!
//! A [`Migrator`] is constructed once per resource family and passed
//! explicitly to whatever drives the host's lifecycle. It does two things:
//!
//! - on every lifecycle event ([`LifecycleEvent::Init`],
//!   [`LifecycleEvent::TenantSwitch`]) it binds the family's physical table
//!   name into the shared [`StoreContext`];
//! - on an explicit [`upgrade`](Migrator::upgrade) it reads the stored
//!   [`SchemaVersion`], runs every [`UpgradeStep`] whose target is newer in
//!   ascending order, and persists each target as soon as its step succeeds.
//!
//! In a multi-tenant host the option store should follow the context's
//! prefix, so that after [`LifecycleEvent::TenantSwitch`] the next
//! [`upgrade`](Migrator::upgrade) compares against the new tenant's version.
//!
//! A run that fails part way leaves the version at the last completed step,
//! so the next run resumes from there. Steps must therefore be idempotent.
//!
//! No lock is held between reading and writing the version. Two processes
//! upgrading at once may both run the same step; with idempotent steps and
//! an unconditional version write this is wasteful but safe.
//!
//! # Example
//!
//! ```
//! use resource_store_core::{ResourceDefinition, SchemaVersion, StoreContext};
//! use resource_store_db::MemoryOptions;
//! use resource_store_sqlite::{Migrator, UpgradeStep};
//! use rusqlite::Connection;
//!
//! let conn = Connection::open_in_memory().unwrap();
//! let ctx = StoreContext::new("wp_").unwrap();
//! let options = MemoryOptions::new();
//! let notes = ResourceDefinition::new("app::Note")
//!     .field("id", "INTEGER PRIMARY KEY AUTOINCREMENT")
//!     .field("body", "TEXT");
//!
//! let migrator = Migrator::new(&conn, &ctx, &options, notes)
//!     .with_step(UpgradeStep::create_table(SchemaVersion::new(1, 0, 0)));
//!
//! let report = migrator.upgrade().unwrap();
//! assert_eq!(report.to, SchemaVersion::new(1, 0, 0));
//! assert_eq!(ctx.table("note").as_deref(), Some("wp_note"));
//! ```

use std::cell::Cell;
use std::fmt;

use resource_store_core::{Resource, SchemaVersion, StoreContext, base_table_name, resolve_table_name};
use resource_store_db::OptionStore;
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::error::{MigrationError, SchemaError, StepError};
use crate::query::RecordStore;
use crate::schema::{ChangeSummary, SchemaBuilder};

/// Host lifecycle points at which the table name is (re)registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Process or application start.
    Init,
    /// The active tenant, and with it the table prefix, changed.
    TenantSwitch,
}

/// Where a [`Migrator`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigratorState {
    Uninitialized,
    /// Table name bound; stored version not yet compared.
    Registered,
    Upgrading,
    UpToDate,
}

/// What an upgrade step's action sees.
pub struct StepContext<'c> {
    conn: &'c Connection,
    ctx: &'c StoreContext,
    resource: &'c dyn Resource,
    table_options: &'c str,
}

impl<'c> StepContext<'c> {
    pub fn connection(&self) -> &'c Connection {
        self.conn
    }

    /// Physical table name of the family under the current prefix.
    pub fn table(&self) -> String {
        resolve_table_name(self.resource, &self.ctx.prefix())
    }

    pub fn prefix(&self) -> String {
        self.ctx.prefix()
    }

    pub fn schema(&self) -> SchemaBuilder<'c> {
        SchemaBuilder::new(self.conn).with_table_options(self.table_options)
    }

    pub fn records(&self) -> RecordStore<'c, dyn Resource + 'c> {
        RecordStore::new(self.conn, self.ctx, self.resource)
    }

    /// Creates the family's table, or adds any columns it is missing.
    pub fn ensure_table(&self) -> Result<ChangeSummary, SchemaError> {
        self.schema().ensure_resource(self.resource, &self.ctx.prefix())
    }
}

type StepAction = Box<dyn for<'s> Fn(&StepContext<'s>) -> Result<(), StepError>>;

/// One versioned, idempotent unit of schema or data migration.
pub struct UpgradeStep {
    target: SchemaVersion,
    name: String,
    action: StepAction,
}

impl UpgradeStep {
    pub fn new<F>(target: SchemaVersion, name: impl Into<String>, action: F) -> Self
    where
        F: for<'s> Fn(&StepContext<'s>) -> Result<(), StepError> + 'static,
    {
        Self {
            target,
            name: name.into(),
            action: Box::new(action),
        }
    }

    /// A step that ensures the family's table matches its current fields.
    pub fn create_table(target: SchemaVersion) -> Self {
        Self::new(target, format!("create_table_{target}"), |step| {
            step.ensure_table()?;
            Ok(())
        })
    }

    pub fn target(&self) -> SchemaVersion {
        self.target
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for UpgradeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpgradeStep")
            .field("target", &self.target)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Outcome of [`Migrator::upgrade`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeReport {
    /// Version stored before the run.
    pub from: SchemaVersion,
    /// Version stored after the run.
    pub to: SchemaVersion,
    /// Names of the steps that ran, in order.
    pub applied: Vec<String>,
}

impl UpgradeReport {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Registers and upgrades one resource family.
pub struct Migrator<'a, R: Resource> {
    conn: &'a Connection,
    ctx: &'a StoreContext,
    options: &'a dyn OptionStore,
    resource: R,
    version_key: String,
    steps: Vec<UpgradeStep>,
    table_options: String,
    state: Cell<MigratorState>,
}

impl<'a, R: Resource> Migrator<'a, R> {
    /// Creates a migrator with no steps.
    ///
    /// The version key defaults to `<table>_db_version`, where `<table>` is
    /// the unprefixed table name.
    pub fn new(
        conn: &'a Connection,
        ctx: &'a StoreContext,
        options: &'a dyn OptionStore,
        resource: R,
    ) -> Self {
        let version_key = format!("{}_db_version", base_table_name(&resource));
        Self {
            conn,
            ctx,
            options,
            resource,
            version_key,
            steps: Vec::new(),
            table_options: String::new(),
            state: Cell::new(MigratorState::Uninitialized),
        }
    }

    pub fn with_version_key(mut self, key: impl Into<String>) -> Self {
        self.version_key = key.into();
        self
    }

    /// Options appended to tables created by steps (see
    /// [`SchemaBuilder::with_table_options`]).
    pub fn with_table_options(mut self, options: impl Into<String>) -> Self {
        self.table_options = options.into();
        self
    }

    /// Adds a step, keeping steps ordered by target version. Two steps with
    /// the same target make [`upgrade`](Self::upgrade) fail with
    /// [`MigrationError::DuplicateTarget`].
    pub fn with_step(mut self, step: UpgradeStep) -> Self {
        let at = self.steps.partition_point(|s| s.target <= step.target);
        self.steps.insert(at, step);
        self
    }

    pub fn resource(&self) -> &R {
        &self.resource
    }

    pub fn state(&self) -> MigratorState {
        self.state.get()
    }

    pub fn version_key(&self) -> &str {
        &self.version_key
    }

    pub fn steps(&self) -> &[UpgradeStep] {
        &self.steps
    }

    /// Name under which the table is bound in the [`StoreContext`].
    pub fn family(&self) -> String {
        base_table_name(&self.resource)
    }

    /// Physical table name under the current prefix.
    pub fn table(&self) -> String {
        resolve_table_name(&self.resource, &self.ctx.prefix())
    }

    /// Target of the last registered step, or `0.0.0` with no steps.
    pub fn latest_version(&self) -> SchemaVersion {
        self.steps
            .last()
            .map_or(SchemaVersion::ZERO, |s| s.target)
    }

    /// Binds the resolved table name into the shared context.
    pub fn register_table(&self) {
        let table = self.table();
        debug!(family = %self.family(), %table, "registering table");
        self.ctx.bind_table(self.family(), table);
        if self.state.get() == MigratorState::Uninitialized {
            self.state.set(MigratorState::Registered);
        }
    }

    /// Reacts to a host lifecycle event.
    ///
    /// After a tenant switch the stored version of the new tenant has not
    /// been checked, so the migrator drops back to `Registered`. Each tenant
    /// keeps its own version only if the option store follows the prefix
    /// ([`SqliteOptions::for_context`](crate::SqliteOptions::for_context) or
    /// [`TenantOptions`](resource_store_db::TenantOptions)).
    pub fn handle(&self, event: LifecycleEvent) {
        self.register_table();
        if event == LifecycleEvent::TenantSwitch {
            self.state.set(MigratorState::Registered);
        }
    }

    /// Stored version, or `0.0.0` if none has been stored.
    pub fn get_version(&self) -> Result<SchemaVersion, MigrationError> {
        match self.options.get_option(&self.version_key)? {
            None => Ok(SchemaVersion::ZERO),
            Some(value) => value
                .parse()
                .map_err(|_| MigrationError::InvalidStoredVersion {
                    key: self.version_key.clone(),
                    value,
                }),
        }
    }

    /// Stores `version` unconditionally.
    pub fn update_version(&self, version: SchemaVersion) -> Result<(), MigrationError> {
        self.options
            .update_option(&self.version_key, &version.to_string())?;
        info!(key = %self.version_key, %version, "updated schema version");
        Ok(())
    }

    /// Stores the current version if nothing is stored yet. Returns `true`
    /// if a value was written.
    pub fn add_version(&self) -> Result<bool, MigrationError> {
        let version = self.get_version()?;
        Ok(self
            .options
            .add_option(&self.version_key, &version.to_string())?)
    }

    /// Returns `true` if some step targets a version newer than the stored one.
    pub fn needs_upgrade(&self) -> Result<bool, MigrationError> {
        Ok(self.latest_version() > self.get_version()?)
    }

    /// Runs every step whose target is newer than the stored version.
    ///
    /// # Errors
    ///
    /// - [`MigrationError::DuplicateTarget`] if two steps share a target.
    /// - [`MigrationError::StepFailed`] if a step fails; later steps do not
    ///   run and the stored version is that of the last completed step.
    pub fn upgrade(&self) -> Result<UpgradeReport, MigrationError> {
        if let Some(pair) = self.steps.windows(2).find(|w| w[0].target == w[1].target) {
            return Err(MigrationError::DuplicateTarget(pair[0].target));
        }

        self.register_table();
        let from = self.get_version()?;
        let pending: Vec<&UpgradeStep> = self.steps.iter().filter(|s| s.target > from).collect();

        let mut report = UpgradeReport {
            from,
            to: from,
            applied: Vec::new(),
        };

        if pending.is_empty() {
            debug!(family = %self.family(), version = %from, "schema up to date");
            self.state.set(MigratorState::UpToDate);
            return Ok(report);
        }

        info!(
            family = %self.family(),
            from = %from,
            to = %self.latest_version(),
            steps = pending.len(),
            "upgrading schema"
        );
        self.state.set(MigratorState::Upgrading);

        let step_ctx = StepContext {
            conn: self.conn,
            ctx: self.ctx,
            resource: &self.resource,
            table_options: &self.table_options,
        };

        for step in pending {
            debug!(step = %step.name, target = %step.target, "running upgrade step");
            if let Err(cause) = (step.action)(&step_ctx) {
                warn!(step = %step.name, target = %step.target, error = %cause, "upgrade step failed");
                self.state.set(MigratorState::Registered);
                return Err(MigrationError::StepFailed {
                    step: step.name.clone(),
                    target: step.target,
                    cause,
                });
            }
            if let Err(err) = self.update_version(step.target) {
                self.state.set(MigratorState::Registered);
                return Err(err);
            }
            report.to = step.target;
            report.applied.push(step.name.clone());
        }

        self.state.set(MigratorState::UpToDate);
        Ok(report)
    }
}
