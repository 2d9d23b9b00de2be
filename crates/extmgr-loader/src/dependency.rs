//! Dependency validation.
//!
//! An extension may export `fd_ext_depends`, a NULL-terminated array whose
//! element 0 is its own name and whose remaining elements name the
//! extensions it needs. A prerequisite is satisfied only by an extension
//! configured *earlier*; configuration order is the dependency order and
//! nothing is reordered.

use std::ffi::CString;
use std::path::Path;

use tracing::debug;

use extmgr_core::error::ExtensionError;
use extmgr_core::result::ExtResult;

use crate::ffi::abi::DEPENDS_SYMBOL;
use crate::ffi::safety::{ExtensionName, read_dependency_array};
use crate::module::ModuleHandle;

/// What a module says about itself.
#[derive(Debug, Clone)]
pub struct Declaration {
    /// Effective extension name.
    pub name: ExtensionName,
    /// Declared prerequisites, `None` for modules without the symbol.
    pub dependencies: Option<Vec<CString>>,
}

impl Declaration {
    /// Whether this is a legacy module without a dependency array.
    pub fn is_legacy(&self) -> bool {
        self.dependencies.is_none()
    }
}

/// Reads the name and prerequisites exported by an opened module.
///
/// Without `fd_ext_depends` the name is the final component of
/// `module_path` and no prerequisites are declared.
pub fn read_declaration(module: &dyn ModuleHandle, module_path: &Path) -> Declaration {
    let entries = module
        .resolve(DEPENDS_SYMBOL)
        // SAFETY: `fd_ext_depends` is a NULL-terminated array of C strings
        // per the extension ABI, alive while `module` is open.
        .map(|array| unsafe { read_dependency_array(array) })
        .unwrap_or_default();

    let Some((own, prerequisites)) = entries.split_first() else {
        let name = ExtensionName::from_path(module_path);
        debug!(extension = %name, "Legacy extension API: no dependency declaration");
        return Declaration {
            name,
            dependencies: None,
        };
    };

    Declaration {
        name: ExtensionName::Borrowed(*own),
        dependencies: Some(
            prerequisites
                .iter()
                .map(|dep| dep.as_c_str().to_owned())
                .collect(),
        ),
    }
}

/// Checks that every declared prerequisite names an earlier extension.
///
/// `earlier` yields the names of the extensions configured before the one
/// being validated. Stops at the first prerequisite that is not found.
pub fn check_dependencies<'a, I>(earlier: I, declaration: &Declaration) -> ExtResult<()>
where
    I: IntoIterator<Item = &'a ExtensionName> + Clone,
{
    let Some(dependencies) = &declaration.dependencies else {
        return Ok(());
    };

    debug!(extension = %declaration.name, "Checking dependencies");

    for dependency in dependencies {
        let wanted = dependency.as_bytes();
        let found = earlier.clone().into_iter().any(|name| name.matches(wanted));
        if !found {
            return Err(ExtensionError::UnsatisfiedDependency {
                extension: declaration.name.to_string(),
                dependency: dependency.to_string_lossy().into_owned(),
            });
        }
    }

    Ok(())
}
