/// Read-only view of the platform's protocol-handler associations.
pub trait HandlerRegistry {
    /// The `shell\open\command` value registered for `protocol`, if any.
    fn open_command(&self, protocol: &str) -> Option<String>;
}

/// The registry of the machine we're running on. Only Windows has one.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRegistry;

#[cfg(windows)]
impl HandlerRegistry for SystemRegistry {
    fn open_command(&self, protocol: &str) -> Option<String> {
        use windows::Win32::System::Registry::{HKEY_CLASSES_ROOT, RRF_RT_REG_SZ, RegGetValueW};
        use windows::core::PCWSTR;

        let subkey: Vec<u16> = format!(r"{protocol}\shell\open\command")
            .encode_utf16()
            .chain(std::iter::once(0))
            .collect();

        let mut size: u32 = 0;
        // SAFETY: `subkey` is NUL-terminated and outlives the call; a null value name reads the default value.
        let status = unsafe {
            RegGetValueW(HKEY_CLASSES_ROOT, PCWSTR(subkey.as_ptr()), PCWSTR::null(), RRF_RT_REG_SZ, None, None, Some(&mut size))
        };
        if status.is_err() || size == 0 {
            return None;
        }

        let mut buf = vec![0u16; (size as usize).div_ceil(2)];
        // SAFETY: `buf` holds `size` bytes as reported by the previous query.
        let status = unsafe {
            RegGetValueW(
                HKEY_CLASSES_ROOT,
                PCWSTR(subkey.as_ptr()),
                PCWSTR::null(),
                RRF_RT_REG_SZ,
                None,
                Some(buf.as_mut_ptr().cast()),
                Some(&mut size),
            )
        };
        if status.is_err() {
            return None;
        }

        let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
        Some(String::from_utf16_lossy(&buf[..len]))
    }
}

#[cfg(not(windows))]
impl HandlerRegistry for SystemRegistry {
    fn open_command(&self, _protocol: &str) -> Option<String> {
        None
    }
}
