/// AdapterSelector - picks the adapter the bootstrap runs on

use crate::device::{AdapterDescriptor, Driver, FeatureLevel};
use crate::error::{Error, Result};
use crate::{boot_err, boot_info, boot_warn};

const SOURCE: &str = "bootstrap::AdapterSelector";

pub struct AdapterSelector;

impl AdapterSelector {
    /// Every adapter the driver reports, in enumeration order
    pub fn enumerate(driver: &dyn Driver) -> Result<Vec<AdapterDescriptor>> {
        let mut adapters = Vec::new();
        while let Some(adapter) = driver.adapter(adapters.len() as u32)? {
            adapters.push(adapter);
        }
        Ok(adapters)
    }

    /// Select an adapter by explicit index or by capability probing
    ///
    /// # Arguments
    ///
    /// * `driver` - Driver to enumerate
    /// * `explicit_index` - Bind this enumeration position directly (no probe)
    /// * `baseline` - Feature level the probe tests for
    ///
    /// # Errors
    ///
    /// * `AdapterNotFound` - `explicit_index` is out of range
    /// * `NoCapableAdapterFound` - no hardware adapter passed the probe
    pub fn select(
        driver: &dyn Driver,
        explicit_index: Option<u32>,
        baseline: FeatureLevel,
    ) -> Result<AdapterDescriptor> {
        boot_info!(SOURCE, "Enumerating adapters..");

        if let Some(index) = explicit_index {
            return match driver.adapter(index) {
                Ok(Some(adapter)) => {
                    boot_info!(SOURCE, "Adapter [{}] => {} (explicit)", index, adapter.name);
                    Ok(adapter)
                }
                Ok(None) => Err(boot_err!(SOURCE, Error::AdapterNotFound(index))),
                Err(e) => {
                    boot_warn!(SOURCE, "Enumerating adapter {} failed: {}", index, e);
                    Err(boot_err!(SOURCE, Error::AdapterNotFound(index)))
                }
            };
        }

        let mut index = 0;
        loop {
            let adapter = match driver.adapter(index) {
                Ok(Some(adapter)) => adapter,
                Ok(None) => break,
                Err(e) => {
                    boot_warn!(SOURCE, "Enumeration stopped at adapter {}: {}", index, e);
                    break;
                }
            };
            boot_info!(SOURCE, "Adapter [{}] => {}", index, adapter.name);
            index += 1;

            if adapter.is_software() {
                boot_info!(SOURCE, "Skipping software adapter {}", adapter.index);
                continue;
            }

            if driver.probe(&adapter, baseline) {
                boot_info!(SOURCE, "Selected adapter {} ({}) at feature level {}",
                    adapter.index, adapter.name, baseline);
                return Ok(adapter);
            }
        }

        Err(boot_err!(SOURCE, Error::NoCapableAdapterFound))
    }
}

#[cfg(test)]
#[path = "adapter_tests.rs"]
mod tests;
