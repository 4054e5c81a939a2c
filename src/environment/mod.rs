//! The environment orchestrator.
//!
//! An [`Environment`] ties together the resolved paths, the layered config,
//! the injected provider registry, the installed boxes, and the machine
//! cache. Every lifecycle operation starts from one.

pub mod home;
pub mod resolver;

pub use home::setup_home_path;
pub use resolver::{
    default_home_path, resolve_cwd, resolve_default_provider, resolve_home_path,
    resolve_project_file, Resolved, SettingSource,
};

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use once_cell::sync::OnceCell;
use tracing::{debug, info};

use crate::action::{keys, ActionContext, ActionRunner};
use crate::boxes::{BoxCollection, BoxHandle};
use crate::config::{
    find_root_path, load_config, load_layer, ConfigSources, LayerKind, LoadedConfig, MachineConfig,
};
use crate::error::{HangarError, Result};
use crate::machine::{Machine, MachineParts};
use crate::provider::{ProviderContext, ProviderRegistry};
use crate::ui::{SilentUI, UserInterface};

/// Provider used when neither the caller nor the config names one.
pub const DEFAULT_PROVIDER: &str = "virtualbox";

/// Name of the per-project data directory.
pub const LOCAL_DATA_DIR: &str = ".hangar";

/// Paths an environment operates on; fixed once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentPaths {
    pub cwd: PathBuf,
    pub home_path: PathBuf,
    /// `<root or cwd>/.hangar`
    pub local_data_path: PathBuf,
    /// Directory holding the project source, if one was found
    pub root_path: Option<PathBuf>,
    pub project_file_name: String,
}

impl EnvironmentPaths {
    pub fn boxes_path(&self) -> PathBuf {
        self.home_path.join("boxes")
    }

    pub fn tmp_path(&self) -> PathBuf {
        self.home_path.join("tmp")
    }

    /// Data directory of one machine under one provider.
    pub fn machine_data_path(&self, name: &str, provider: &str) -> PathBuf {
        self.local_data_path
            .join("machines")
            .join(name)
            .join(provider)
    }
}

/// Construction options. Anything left unset is resolved from `HANGAR_*`
/// environment variables, then from built-in defaults.
#[derive(Default)]
pub struct EnvironmentOptions {
    pub cwd: Option<PathBuf>,
    pub home_path: Option<PathBuf>,
    pub project_file_name: Option<String>,
    pub default_provider: Option<String>,
    pub ui: Option<Arc<dyn UserInterface>>,
    pub providers: ProviderRegistry,
}

impl EnvironmentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn home_path(mut self, home_path: impl Into<PathBuf>) -> Self {
        self.home_path = Some(home_path.into());
        self
    }

    pub fn project_file_name(mut self, name: impl Into<String>) -> Self {
        self.project_file_name = Some(name.into());
        self
    }

    pub fn default_provider(mut self, provider: impl Into<String>) -> Self {
        self.default_provider = Some(provider.into());
        self
    }

    pub fn ui(mut self, ui: Arc<dyn UserInterface>) -> Self {
        self.ui = Some(ui);
        self
    }

    pub fn providers(mut self, providers: ProviderRegistry) -> Self {
        self.providers = providers;
        self
    }
}

type MachineKey = (String, String);

/// A project's environment: config, providers, boxes, and machines.
pub struct Environment {
    paths: Arc<EnvironmentPaths>,
    ui: Arc<dyn UserInterface>,
    providers: ProviderRegistry,
    default_provider: Option<String>,
    default_private_key: PathBuf,
    boxes: BoxCollection,
    runner: ActionRunner,
    config: OnceCell<LoadedConfig>,
    machines: Mutex<HashMap<MachineKey, Arc<Machine>>>,
}

impl Environment {
    /// Resolve paths, prepare the home directory, and build the environment.
    ///
    /// Config is not read until first needed.
    ///
    /// # Errors
    ///
    /// `EnvironmentNonExistentCwd` when the working directory does not exist;
    /// `HomeDirectoryNotAccessible` when the home directory cannot be set up.
    pub fn new(options: EnvironmentOptions) -> Result<Self> {
        Self::with_env_lookup(options, &|key: &str| std::env::var(key).ok())
    }

    /// Like [`new`](Self::new), reading variables through `lookup`.
    pub fn with_env_lookup(
        options: EnvironmentOptions,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let cwd = resolve_cwd(options.cwd.as_deref(), lookup)?;
        let home_path = resolve_home_path(options.home_path.as_deref(), lookup)?;
        let project_file = resolve_project_file(options.project_file_name.as_deref(), lookup);
        let default_provider =
            resolve_default_provider(options.default_provider.as_deref(), lookup);

        debug!("cwd: {} ({})", cwd.value.display(), cwd.source);
        debug!("home: {} ({})", home_path.value.display(), home_path.source);

        let root_path = find_root_path(&cwd.value, &project_file.value);
        let local_data_path = root_path
            .as_deref()
            .unwrap_or(&cwd.value)
            .join(LOCAL_DATA_DIR);

        let default_private_key = setup_home_path(&home_path.value)?;

        let paths = Arc::new(EnvironmentPaths {
            cwd: cwd.value,
            home_path: home_path.value,
            local_data_path,
            root_path,
            project_file_name: project_file.value,
        });
        let ui = options.ui.unwrap_or_else(|| Arc::new(SilentUI));

        let runner = {
            let ui = Arc::clone(&ui);
            let paths = Arc::clone(&paths);
            ActionRunner::new(move || {
                ActionContext::new()
                    .with(keys::UI, Arc::clone(&ui))
                    .with(keys::ENV, Arc::clone(&paths))
            })
        };

        info!(
            "Environment at {} (root: {})",
            paths.cwd.display(),
            paths
                .root_path
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "none".to_string())
        );

        Ok(Self {
            boxes: BoxCollection::new(paths.boxes_path()),
            paths,
            ui,
            providers: options.providers,
            default_provider: default_provider.map(|resolved| resolved.value),
            default_private_key,
            runner,
            config: OnceCell::new(),
            machines: Mutex::new(HashMap::new()),
        })
    }

    pub fn paths(&self) -> &Arc<EnvironmentPaths> {
        &self.paths
    }

    pub fn cwd(&self) -> &Path {
        &self.paths.cwd
    }

    pub fn home_path(&self) -> &Path {
        &self.paths.home_path
    }

    pub fn local_data_path(&self) -> &Path {
        &self.paths.local_data_path
    }

    pub fn root_path(&self) -> Option<&Path> {
        self.paths.root_path.as_deref()
    }

    pub fn ui(&self) -> &Arc<dyn UserInterface> {
        &self.ui
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    pub fn boxes(&self) -> &BoxCollection {
        &self.boxes
    }

    /// Runner whose contexts are seeded with this environment's UI and paths.
    pub fn action_runner(&self) -> &ActionRunner {
        &self.runner
    }

    /// The key installed in the home directory.
    pub fn default_private_key_path(&self) -> &Path {
        &self.default_private_key
    }

    /// The loaded config, read on first access.
    ///
    /// A failed load is not remembered; the next call tries again.
    pub fn config(&self) -> Result<&LoadedConfig> {
        self.config.get_or_try_init(|| {
            let sources = ConfigSources::discover(
                &self.paths.home_path,
                self.paths.root_path.as_deref(),
                &self.paths.project_file_name,
            );
            load_config(&sources)
        })
    }

    /// Machine names in declaration order.
    pub fn machine_names(&self) -> Result<Vec<String>> {
        Ok(self.config()?.machine_names())
    }

    pub fn primary_machine_name(&self) -> Result<Option<String>> {
        Ok(self.config()?.primary().map(|d| d.name.clone()))
    }

    /// The primary machine under its declared provider, or the default one.
    pub fn primary_machine(&self) -> Result<Option<Arc<Machine>>> {
        let Some(definition) = self.config()?.primary() else {
            return Ok(None);
        };
        let provider = match &definition.provider {
            Some(provider) => provider.clone(),
            None => self.default_provider()?,
        };
        self.machine(&definition.name, &provider).map(Some)
    }

    /// The provider used when none is named: the explicit default, else
    /// `vm.provider` from the config, else `virtualbox`.
    pub fn default_provider(&self) -> Result<String> {
        if let Some(provider) = &self.default_provider {
            return Ok(provider.clone());
        }
        Ok(self
            .config()?
            .global()
            .vm
            .provider
            .clone()
            .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()))
    }

    /// The machine `name` under `provider`, built on first request.
    ///
    /// The cache lock is held while a machine is built, so provider
    /// factories must not call back into `machine`.
    ///
    /// # Errors
    ///
    /// `MachineNotFound`, `ProviderNotFound`, `BoxNotFound`, or whatever the
    /// provider factory returns.
    pub fn machine(&self, name: &str, provider: &str) -> Result<Arc<Machine>> {
        let mut cache = self.lock_machines();
        let key = (name.to_string(), provider.to_string());
        if let Some(machine) = cache.get(&key) {
            return Ok(Arc::clone(machine));
        }

        let config = self.config()?;
        if config.definition(name).is_none() {
            return Err(HangarError::MachineNotFound {
                name: name.to_string(),
            });
        }
        let factory = self
            .providers
            .lookup(provider)
            .ok_or_else(|| HangarError::ProviderNotFound {
                name: provider.to_string(),
            })?;

        let (machine_config, box_handle) = self.machine_config(name, provider)?;
        let data_dir = self.paths.machine_data_path(name, provider);
        let instance = factory(&ProviderContext {
            machine_name: name,
            provider_name: provider,
            config: &machine_config,
            data_dir: &data_dir,
        })?;

        debug!("Built machine '{}' with provider '{}'", name, provider);
        let machine = Arc::new(Machine::new(MachineParts {
            name: name.to_string(),
            provider_name: provider.to_string(),
            config: machine_config,
            provider: instance,
            box_handle,
            data_dir,
            ui: Arc::clone(&self.ui),
            runner: self.runner.clone(),
            default_private_key: self.default_private_key.clone(),
        }));
        cache.insert(key, Arc::clone(&machine));
        Ok(machine)
    }

    /// Fold the config of machine `name` for `provider`, including the box
    /// layer when the config names a box.
    ///
    /// Does not build a provider instance.
    pub fn machine_config(
        &self,
        name: &str,
        provider: &str,
    ) -> Result<(MachineConfig, Option<BoxHandle>)> {
        let config = self.config()?;
        let without_box = config.machine_config(name, None)?;
        let Some(box_name) = without_box.vm.box_name.as_deref() else {
            return Ok((without_box, None));
        };

        let handle = self.boxes.require(box_name, provider)?;
        let box_layer = match handle.hangarfile() {
            Some(path) => Some(load_layer(&path, LayerKind::Box)?),
            None => None,
        };
        debug!(
            "Machine '{}' uses box '{}' from {}",
            name,
            box_name,
            handle.directory.display()
        );
        Ok((config.machine_config(name, box_layer)?, Some(handle)))
    }

    /// Machines with a persisted id, as `(name, provider)` pairs in
    /// declaration order.
    pub fn active_machines(&self) -> Result<Vec<(String, String)>> {
        let mut active = Vec::new();
        for name in self.machine_names()? {
            let dir = self.paths.local_data_path.join("machines").join(&name);
            if !dir.is_dir() {
                continue;
            }

            let mut providers = Vec::new();
            for entry in fs::read_dir(&dir)? {
                let entry = entry?;
                if !entry.file_type()?.is_dir() {
                    continue;
                }
                let Some(provider) = entry.file_name().to_str().map(str::to_string) else {
                    continue;
                };
                let id = match fs::read_to_string(entry.path().join("id")) {
                    Ok(id) => id,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                    Err(e) => return Err(e.into()),
                };
                if !id.trim().is_empty() {
                    providers.push(provider);
                }
            }
            providers.sort();
            active.extend(providers.into_iter().map(|p| (name.clone(), p)));
        }
        Ok(active)
    }

    /// Drop every cached machine. Later lookups build fresh instances.
    pub fn clear_machine_cache(&self) {
        self.lock_machines().clear();
    }

    fn lock_machines(&self) -> MutexGuard<'_, HashMap<MachineKey, Arc<Machine>>> {
        self.machines.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("paths", &self.paths)
            .field("providers", &self.providers)
            .finish_non_exhaustive()
    }
}
