//! Orb file header
//!
//! # Layout
//! ```text
//! 0x00: magic            4 bytes  "OFF\0"
//! 0x04: version major    u16
//! 0x06: version revision u16
//! 0x08: build number     u16
//! 0x0A: unused           2 bytes
//! 0x0C: num_lights       u16
//! 0x0E: num_materials    u16
//! 0x10: num_textures     u16
//! 0x12: num_meshes       u16
//! 0x14: num_animations   u16  (always 0 in this version)
//! ```

/// Orb container magic bytes.
pub const ORB_MAGIC: [u8; 4] = *b"OFF\0";

/// Version stamped into files written by the current tools.
pub const ORB_VERSION: OrbVersion = OrbVersion {
    major: 3,
    revision: 3,
    build: 0,
};

/// Orb format version record (8 bytes on disk).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrbVersion {
    pub major: u16,
    pub revision: u16,
    pub build: u16,
}

impl OrbVersion {
    pub const SIZE: usize = 8;

    /// Whether a file with this version can still be decoded.
    ///
    /// Files older than major 3 revision 3 predate the current mesh
    /// section layout and are rejected.
    pub fn is_supported(&self) -> bool {
        self.major > 3 || (self.major == 3 && self.revision > 2)
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..2].copy_from_slice(&self.major.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.revision.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.build.to_le_bytes());
        // trailing 2 bytes unused
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            major: u16::from_le_bytes([bytes[0], bytes[1]]),
            revision: u16::from_le_bytes([bytes[2], bytes[3]]),
            build: u16::from_le_bytes([bytes[4], bytes[5]]),
        })
    }
}

/// Orb file header (magic + version + section counts, 22 bytes).
#[derive(Debug, Clone, Copy)]
pub struct OrbHeader {
    pub version: OrbVersion,
    pub num_lights: u16,
    pub num_materials: u16,
    pub num_textures: u16,
    pub num_meshes: u16,
    pub num_animations: u16,
}

impl OrbHeader {
    pub const SIZE: usize = 4 + OrbVersion::SIZE + 10;

    pub fn new(num_lights: u16, num_materials: u16, num_textures: u16, num_meshes: u16) -> Self {
        Self {
            version: ORB_VERSION,
            num_lights,
            num_materials,
            num_textures,
            num_meshes,
            num_animations: 0,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&ORB_MAGIC);
        bytes[4..12].copy_from_slice(&self.version.to_bytes());
        bytes[12..14].copy_from_slice(&self.num_lights.to_le_bytes());
        bytes[14..16].copy_from_slice(&self.num_materials.to_le_bytes());
        bytes[16..18].copy_from_slice(&self.num_textures.to_le_bytes());
        bytes[18..20].copy_from_slice(&self.num_meshes.to_le_bytes());
        bytes[20..22].copy_from_slice(&self.num_animations.to_le_bytes());
        bytes
    }

    /// Parse a header from the start of an Orb file.
    ///
    /// Returns `None` if the slice is too short or the magic does not
    /// match.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE || bytes[0..4] != ORB_MAGIC {
            return None;
        }
        Some(Self {
            version: OrbVersion::from_bytes(&bytes[4..12])?,
            num_lights: u16::from_le_bytes([bytes[12], bytes[13]]),
            num_materials: u16::from_le_bytes([bytes[14], bytes[15]]),
            num_textures: u16::from_le_bytes([bytes[16], bytes[17]]),
            num_meshes: u16::from_le_bytes([bytes[18], bytes[19]]),
            num_animations: u16::from_le_bytes([bytes[20], bytes[21]]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trip() {
        let header = OrbHeader::new(1, 2, 3, 4);
        let bytes = header.to_bytes();
        let parsed = OrbHeader::from_bytes(&bytes).expect("header should parse");
        assert_eq!(parsed.version, ORB_VERSION);
        assert_eq!(parsed.num_lights, 1);
        assert_eq!(parsed.num_materials, 2);
        assert_eq!(parsed.num_textures, 3);
        assert_eq!(parsed.num_meshes, 4);
        assert_eq!(parsed.num_animations, 0);
    }

    #[test]
    fn bad_magic_rejected() {
        let mut bytes = OrbHeader::new(0, 0, 0, 0).to_bytes();
        bytes[0] = b'X';
        assert!(OrbHeader::from_bytes(&bytes).is_none());
    }

    #[test]
    fn version_gate() {
        let too_old = [
            OrbVersion { major: 2, revision: 9, build: 0 },
            OrbVersion { major: 3, revision: 2, build: 0 },
        ];
        for v in too_old {
            assert!(!v.is_supported(), "{v:?} should be rejected");
        }
        assert!(OrbVersion { major: 3, revision: 3, build: 0 }.is_supported());
        assert!(OrbVersion { major: 4, revision: 0, build: 0 }.is_supported());
    }
}
