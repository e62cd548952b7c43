/// Fixed-point lookup for sprite scaling: entry `i` holds `i * scale` split
/// into its integer (`whole`) and fractional (`fraction`) bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleTable {
    whole: [u8; 256],
    fraction: [u8; 256],
}

impl Default for ScaleTable {
    fn default() -> Self {
        Self {
            whole: [0; 256],
            fraction: [0; 256],
        }
    }
}

impl ScaleTable {
    /// `scale` is an 8.8 fixed-point ratio; 0x100 is 1:1.
    pub fn set_scale(&mut self, scale: u32) {
        let mut total = 0u32;
        for idx in 0..256 {
            self.whole[idx] = (total >> 8) as u8;
            self.fraction[idx] = (total & 0xFF) as u8;
            total = total.wrapping_add(scale);
        }
    }

    pub fn whole(&self) -> &[u8; 256] {
        &self.whole
    }

    pub fn fraction(&self) -> &[u8; 256] {
        &self.fraction
    }
}
