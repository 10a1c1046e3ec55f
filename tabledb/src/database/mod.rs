use crate::config::DatabaseConfig;
use crate::document::{self, LoadReport};
use crate::error::Result;
use crate::schema::{TableDescriptor, Tables};
use crate::storage::FileStorage;
use std::ops::{Deref, DerefMut};
use std::path::Path;

/// The main entry point for tabledb.
///
/// Owns a host object and persists all of its tables as one JSON document.
/// The host is reachable through `Deref`/`DerefMut`, so `db.scores.add(45)`
/// works directly on the database handle.
///
/// When `save_on_exit` is set the database saves once more when it goes out
/// of scope, including while unwinding. Failures at that point are logged and
/// swallowed; call [`Database::close`] to observe them instead.
pub struct Database<H: Tables> {
    host: Option<H>,
    config: DatabaseConfig,
    descriptors: Vec<TableDescriptor>,
    storage: FileStorage,
    armed: bool,
}

impl<H: Tables> Database<H> {
    /// Open a database over `host`.
    /// Loads the document right away unless `load_late` is set.
    pub fn open(config: DatabaseConfig, host: H) -> Result<Self> {
        let mut db = Self::prepare(config, host)?;
        if !db.config.load_late {
            db.load()?;
        }
        db.armed = db.config.save_on_exit;
        Ok(db)
    }

    /// Like [`Database::open`], but performs the initial load asynchronously.
    pub async fn open_async(config: DatabaseConfig, host: H) -> Result<Self> {
        let mut db = Self::prepare(config, host)?;
        if !db.config.load_late {
            db.load_async().await?;
        }
        db.armed = db.config.save_on_exit;
        Ok(db)
    }

    fn prepare(config: DatabaseConfig, host: H) -> Result<Self> {
        config.validate()?;
        let descriptors = H::descriptors();
        log::info!(
            "Opening database at {} with {} table(s)",
            config.path.display(),
            descriptors.len()
        );
        for descriptor in &descriptors {
            log::debug!(
                "Table '{}' holds {}",
                descriptor.name(),
                descriptor.element_type()
            );
        }

        let storage = FileStorage::new(config.path.clone());
        // Not armed until a load succeeds or open returns.
        Ok(Database {
            host: Some(host),
            config,
            descriptors,
            storage,
            armed: false,
        })
    }

    /// Replace every table present in the document with its stored contents.
    /// A missing file is not an error; tables keep their current values.
    ///
    /// A failed load disarms the exit save, so an unreadable document is not
    /// replaced by whatever the tables held before. The next successful load
    /// arms it again.
    pub fn load(&mut self) -> Result<LoadReport> {
        if !self.storage.exists() {
            log::info!(
                "No document at {}, keeping current tables",
                self.path().display()
            );
            return self.settle(Ok(LoadReport::missing_file()));
        }
        let loaded = self
            .storage
            .read_all()
            .and_then(|bytes| self.apply(&bytes));
        self.settle(loaded)
    }

    pub async fn load_async(&mut self) -> Result<LoadReport> {
        if !self.storage.exists_async().await {
            log::info!(
                "No document at {}, keeping current tables",
                self.path().display()
            );
            return self.settle(Ok(LoadReport::missing_file()));
        }
        let loaded = match self.storage.read_all_async().await {
            Ok(bytes) => self.apply(&bytes),
            Err(e) => Err(e),
        };
        self.settle(loaded)
    }

    fn settle(&mut self, loaded: Result<LoadReport>) -> Result<LoadReport> {
        match &loaded {
            Ok(_) => self.armed = self.config.save_on_exit,
            Err(e) => {
                if self.armed {
                    log::warn!(
                        "Load of {} failed, exit save disabled: {e}",
                        self.storage.path().display()
                    );
                }
                self.armed = false;
            }
        }
        loaded
    }

    fn apply(&mut self, bytes: &[u8]) -> Result<LoadReport> {
        let parsed = document::parse_document(bytes, self.storage.path())?;
        let host = self.host.as_mut().expect("host is present until consumed");
        let report = document::apply_document(host, &self.descriptors, parsed);
        log::info!(
            "Loaded {} table(s) from {} ({} element(s) dropped, {} unmapped key(s))",
            report.tables.len(),
            self.storage.path().display(),
            report.dropped(),
            report.unmapped.len()
        );
        Ok(report)
    }

    /// Write every table to the document, replacing the whole file.
    pub fn save(&self) -> Result<()> {
        let bytes = self.render()?;
        self.storage.write_all(&bytes)?;
        log::info!("Saved database to {}", self.path().display());
        Ok(())
    }

    pub async fn save_async(&self) -> Result<()> {
        let bytes = self.render()?;
        self.storage.write_all_async(&bytes).await?;
        log::info!("Saved database to {}", self.path().display());
        Ok(())
    }

    fn render(&self) -> Result<Vec<u8>> {
        let document = document::encode_document(self.host(), &self.descriptors)?;
        document::render_document(&document, self.config.pretty)
    }

    /// Release the database, saving first when `save_on_exit` is set.
    /// Unlike dropping, a failed save is returned to the caller.
    pub fn close(mut self) -> Result<()> {
        self.armed = false;
        if self.config.save_on_exit {
            self.save()?;
        }
        Ok(())
    }

    /// Give back the host without the exit save.
    pub fn into_inner(mut self) -> H {
        self.armed = false;
        self.host.take().expect("host is present until consumed")
    }

    pub fn descriptors(&self) -> &[TableDescriptor] {
        &self.descriptors
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        self.storage.path()
    }

    pub fn host(&self) -> &H {
        self.host.as_ref().expect("host is present until consumed")
    }

    pub fn host_mut(&mut self) -> &mut H {
        self.host.as_mut().expect("host is present until consumed")
    }
}

impl<H: Tables> Deref for Database<H> {
    type Target = H;

    fn deref(&self) -> &H {
        self.host()
    }
}

impl<H: Tables> DerefMut for Database<H> {
    fn deref_mut(&mut self) -> &mut H {
        self.host_mut()
    }
}

impl<H: Tables> Drop for Database<H> {
    fn drop(&mut self) {
        if !self.armed || self.host.is_none() {
            return;
        }
        self.armed = false;
        if let Err(e) = self.save() {
            log::error!(
                "Exit save to {} failed: {e}",
                self.storage.path().display()
            );
        }
    }
}
