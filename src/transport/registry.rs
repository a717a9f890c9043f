use super::backend::{PortBackend, SystemBackend};
use super::session::{PortState, SessionSettings};
use super::TransportError;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Name prefixes of serial device nodes: ACM modems, USB serial adapters,
/// Bluetooth RFCOMM and legacy UARTs
#[cfg(all(unix, not(target_os = "macos")))]
pub const DEVICE_PREFIXES: &[&str] = &["ttyACM", "ttyUSB", "rfcomm", "ttyS"];

#[cfg(target_os = "macos")]
pub const DEVICE_PREFIXES: &[&str] = &["tty."];

#[cfg(not(unix))]
pub const DEVICE_PREFIXES: &[&str] = &["COM"];

#[cfg(unix)]
const DEFAULT_DEV_DIR: &str = "/dev";

/// Where device names come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceNamespace {
    /// Entries of a directory whose names start with one of the prefixes
    Directory(PathBuf),
    /// Ports reported by the OS serial API, names are their own paths
    SystemPorts,
}

impl Default for DeviceNamespace {
    #[cfg(unix)]
    fn default() -> Self {
        Self::Directory(PathBuf::from(DEFAULT_DEV_DIR))
    }

    #[cfg(not(unix))]
    fn default() -> Self {
        Self::SystemPorts
    }
}

/// One discovered device node
#[derive(Debug)]
pub struct DeviceDescriptor {
    name: String,
    path: PathBuf,
    pub(super) state: PortState,
}

impl DeviceDescriptor {
    fn new(name: String, path: PathBuf) -> Self {
        Self {
            name,
            path,
            state: PortState::Closed,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }
}

/// Inventory of serial devices and their port sessions
///
/// Indices handed out by [`enumerate`](Self::enumerate) stay valid until
/// the next enumeration or [`teardown`](Self::teardown). Each descriptor
/// holds at most one OS handle.
///
/// Device names are grouped by [`DEVICE_PREFIXES`] in table order and
/// sorted naturally inside a prefix, so `ttyACM2` comes before `ttyACM10`
/// and `ttyACM*` before `ttyUSB*`.
///
/// Dropping the registry closes every handle it still owns.
///
/// # Examples
///
/// ```rust,no_run
/// use serial_input::DeviceRegistry;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut registry = DeviceRegistry::system();
/// registry.enumerate();
///
/// if let Some(index) = registry.find_by_name("ttyACM0") {
///     let baud = registry.open(index, 115200)?;
///     println!("ttyACM0 open at {baud}");
///
///     // status request: 1 byte out, 3 bytes back
///     registry.write(index, &[0x01, 0x03, 0x00])?;
///     let mut status = [0u8; 3];
///     registry.read(index, &mut status)?;
///
///     registry.close(index);
/// }
/// # Ok(())
/// # }
/// ```
pub struct DeviceRegistry {
    backend: Box<dyn PortBackend>,
    namespace: DeviceNamespace,
    pub(super) settings: SessionSettings,
    pub(super) devices: Vec<DeviceDescriptor>,
}

impl DeviceRegistry {
    /// Empty registry on top of `backend`, scanning the platform namespace
    pub fn new(backend: impl PortBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            namespace: DeviceNamespace::default(),
            settings: SessionSettings::default(),
            devices: Vec::new(),
        }
    }

    /// Registry using the host's serial ports
    pub fn system() -> Self {
        Self::new(SystemBackend)
    }

    pub fn with_namespace(mut self, namespace: DeviceNamespace) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn with_dev_dir(self, dir: impl Into<PathBuf>) -> Self {
        self.with_namespace(DeviceNamespace::Directory(dir.into()))
    }

    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub(super) fn backend(&self) -> &dyn PortBackend {
        self.backend.as_ref()
    }

    /// Rebuilds the inventory and returns the number of devices found
    ///
    /// Every open handle is closed before the previous entries are
    /// dropped, so all earlier indices are invalid afterwards. Never fails:
    /// an unreadable namespace yields an empty registry.
    pub fn enumerate(&mut self) -> usize {
        self.close_all();

        let names = scan(&self.namespace);
        self.devices = names
            .into_iter()
            .map(|name| {
                let path = match &self.namespace {
                    DeviceNamespace::Directory(dir) => dir.join(&name),
                    DeviceNamespace::SystemPorts => PathBuf::from(&name),
                };
                DeviceDescriptor::new(name, path)
            })
            .collect();

        debug!("Enumerated {} serial devices", self.devices.len());
        self.devices.len()
    }

    pub fn count(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.devices.get(index).map(DeviceDescriptor::name)
    }

    /// Filesystem path of the device node, e.g. `/dev/ttyACM0`
    pub fn path_at(&self, index: usize) -> Option<&Path> {
        self.devices.get(index).map(DeviceDescriptor::path)
    }

    /// Exact, case-sensitive match on the device name
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.devices.iter().position(|device| device.name == name)
    }

    pub fn devices(&self) -> &[DeviceDescriptor] {
        &self.devices
    }

    /// Closes every handle and releases the inventory. Idempotent.
    pub fn teardown(&mut self) {
        if self.devices.is_empty() {
            return;
        }
        self.close_all();
        self.devices.clear();
        info!("Serial device registry torn down");
    }

    pub(super) fn descriptor_mut(
        &mut self,
        index: usize,
    ) -> Result<&mut DeviceDescriptor, TransportError> {
        let count = self.devices.len();
        self.devices
            .get_mut(index)
            .ok_or(TransportError::InvalidIndex { index, count })
    }
}

impl Drop for DeviceRegistry {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn scan(namespace: &DeviceNamespace) -> Vec<String> {
    match namespace {
        DeviceNamespace::Directory(dir) => scan_directory(dir),
        DeviceNamespace::SystemPorts => match serialport::available_ports() {
            Ok(ports) => ports.into_iter().map(|port| port.port_name).collect(),
            Err(e) => {
                warn!("Unable to list system serial ports: {}", e);
                Vec::new()
            }
        },
    }
}

/// Prefix-major order, natural order within a prefix
fn scan_directory(dir: &Path) -> Vec<String> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Unable to scan {} for serial devices: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let names: Vec<String> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();

    let mut found = Vec::new();
    for prefix in DEVICE_PREFIXES {
        let mut matching: Vec<&String> = names
            .iter()
            .filter(|name| name.starts_with(prefix))
            .collect();
        matching.sort_by(|a, b| natural_cmp(a, b));
        found.extend(matching.into_iter().cloned());
    }
    found
}

// ttyS2 before ttyS10
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let split = |name: &str| {
        let stem = name.trim_end_matches(|c: char| c.is_ascii_digit());
        let number = name[stem.len()..].parse::<u64>().ok();
        (stem.to_owned(), number)
    };
    split(a).cmp(&split(b)).then_with(|| a.cmp(b))
}
