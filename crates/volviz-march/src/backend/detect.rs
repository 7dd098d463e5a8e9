//! Backend probing for auto-selection and the CLI's `info` listing.

use super::Backend;

/// Probe result for one integrator backend.
#[derive(Debug, Clone)]
pub struct BackendInfo {
    /// Which backend.
    pub backend: Backend,
    /// Display name.
    pub name: &'static str,
    /// Usable on this machine.
    pub available: bool,
    /// Auto-selection rank; the highest available wins.
    pub rank: u32,
    /// What it runs on.
    pub detail: &'static str,
}

/// Probes every compiled-in backend, best first.
pub fn detect_backends() -> Vec<BackendInfo> {
    let mut found = Vec::with_capacity(2);

    #[cfg(feature = "wgpu")]
    {
        let available = super::WgpuBackend::is_available();
        found.push(BackendInfo {
            backend: Backend::Wgpu,
            name: "wgpu",
            available,
            rank: if available { 2 } else { 0 },
            detail: "compute-shader ray marching (Vulkan/Metal/DX12)",
        });
    }

    found.push(BackendInfo {
        backend: Backend::Cpu,
        name: "CPU",
        available: true,
        rank: 1,
        detail: "reference ray marching, one rayon task per row",
    });
    found.sort_by_key(|b| std::cmp::Reverse(b.rank));
    found
}

/// Backend chosen for [`Backend::Auto`].
pub fn select_best_backend() -> Backend {
    detect_backends()
        .iter()
        .find(|b| b.available)
        .map_or(Backend::Cpu, |b| b.backend)
}

/// Human-readable backend table, one line each.
pub fn describe_backends() -> String {
    detect_backends()
        .iter()
        .map(|b| format!("[{}] {}: {}\n", if b.available { '+' } else { '-' }, b.name, b.detail))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_always_listed() {
        let all = detect_backends();
        assert!(all.iter().any(|b| b.backend == Backend::Cpu && b.available));
        assert!(all.windows(2).all(|w| w[0].rank >= w[1].rank));
        assert!(select_best_backend() != Backend::Auto);
    }
}
