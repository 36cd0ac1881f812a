use super::{Binding, BindingSource};

/// A binding declared at link time via `inventory`.
///
/// Extensions compiled into the binary submit their bindings statically:
///
/// ```rust,ignore
/// inventory::submit! {
///     DeclaredBinding::new("session", "tracker", "app", "start")
/// }
/// ```
pub struct DeclaredBinding {
    /// Extension shipping the listener.
    pub extension: &'static str,
    /// Library inside the extension.
    pub library: &'static str,
    /// Event namespace.
    pub namespace: &'static str,
    /// Event name.
    pub name: &'static str,
}

impl DeclaredBinding {
    /// Declare a binding.
    pub const fn new(
        extension: &'static str,
        library: &'static str,
        namespace: &'static str,
        name: &'static str,
    ) -> Self {
        Self {
            extension,
            library,
            namespace,
            name,
        }
    }
}

inventory::collect!(DeclaredBinding);

/// Every [`DeclaredBinding`] linked into the binary.
///
/// Link order is unspecified, so bindings are returned sorted by extension,
/// library, namespace and name to keep reloads deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectedBindings;

impl BindingSource for CollectedBindings {
    fn bindings(&self) -> Vec<Binding> {
        let mut declared: Vec<&DeclaredBinding> = inventory::iter::<DeclaredBinding>
            .into_iter()
            .collect();
        declared.sort_by_key(|d| (d.extension, d.library, d.namespace, d.name));

        declared
            .into_iter()
            .map(|d| Binding::new(d.extension, d.library, d.namespace, d.name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    inventory::submit! {
        DeclaredBinding::new("zeta", "audit", "app", "start")
    }

    inventory::submit! {
        DeclaredBinding::new("alpha", "boot", "app", "start")
    }

    #[test]
    fn collected_bindings_are_sorted() {
        let bindings = CollectedBindings.bindings();
        let keys: Vec<String> = bindings.iter().map(|b| b.key().to_string()).collect();

        let alpha = keys.iter().position(|k| k == "alpha:boot").unwrap();
        let zeta = keys.iter().position(|k| k == "zeta:audit").unwrap();
        assert!(alpha < zeta);
    }
}
