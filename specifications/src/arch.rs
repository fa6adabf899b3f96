/* ARCH.rs
 *   by the kiln authors
 *
 * Created:
 *   02 Mar 2026, 10:15:02
 * Last edited:
 *   21 Sep 2026, 09:40:57
 * Auto updated?
 *   Yes
 *
 * Description:
 *   Defines the target architectures we know how to cross-compile a
 *   kernel or bootloader for.
**/

use std::fmt::{Display, Formatter, Result as FResult};
use std::hash::Hash;

use serde::{Deserialize, Serialize};


/***** TESTS *****/
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arch_parse_aliases() {
        assert_eq!(serde_yaml::from_str::<Arch>("amd64").unwrap(), Arch::x86_64);
        assert_eq!(serde_yaml::from_str::<Arch>("armhf").unwrap(), Arch::arm);
        assert!(serde_yaml::from_str::<Arch>("riscv64").is_err());
    }

    #[test]
    fn arch_kernel_names() {
        assert_eq!(Arch::aarch64.to_kernel(), "arm64");
        assert_eq!(Arch::x86_64.to_kernel(), "x86_64");
        assert_eq!(Arch::arm.to_kernel(), "arm");
    }

    #[test]
    fn arch_serde_alias() {
        let arch: Arch = serde_yaml::from_str("arm64").unwrap();
        assert_eq!(arch, Arch::aarch64);
        let arch: Arch = serde_yaml::from_str("aarch64").unwrap();
        assert_eq!(arch, Arch::aarch64);
    }
}





/***** LIBRARY *****/
/// The Arch enum defines the architectures we can cross-compile for.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Arch {
    /// The standard x86_64 architecture
    #[serde(alias="amd64")]
    x86_64,
    /// The 64-bit ARM architecture (Raspberry Pi 3 and later, most SBCs)
    #[serde(alias="arm64")]
    aarch64,
    /// The 32-bit ARM architecture (older boards, some bootloaders)
    #[serde(alias="armhf")]
    arm,
}

impl Arch {
    /// Serializes the Arch in the way the kernel's (and U-Boot's) `ARCH=` make variable expects it.
    #[inline]
    pub fn to_kernel(&self) -> &'static str {
        match self {
            Arch::x86_64  => "x86_64",
            Arch::aarch64 => "arm64",
            Arch::arm     => "arm",
        }
    }
}

impl Display for Arch {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        match self {
            Arch::x86_64  => write!(f, "x86_64"),
            Arch::aarch64 => write!(f, "aarch64"),
            Arch::arm     => write!(f, "arm"),
        }
    }
}
