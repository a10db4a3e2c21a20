/*!
 * Class of Device decoding
 * Major and major+minor device codes from the Bluetooth assigned numbers
 */

const MAJOR_MASK: u32 = 0x1F00;
const DEVICE_MASK: u32 = 0x1FFC;

pub mod major {
    pub const MISC: u32 = 0x0000;
    pub const COMPUTER: u32 = 0x0100;
    pub const PHONE: u32 = 0x0200;
    pub const NETWORKING: u32 = 0x0300;
    pub const AUDIO_VIDEO: u32 = 0x0400;
    pub const PERIPHERAL: u32 = 0x0500;
    pub const IMAGING: u32 = 0x0600;
    pub const WEARABLE: u32 = 0x0700;
    pub const TOY: u32 = 0x0800;
    pub const HEALTH: u32 = 0x0900;
    pub const UNCATEGORIZED: u32 = 0x1F00;
}

/// Audio/video minor classes, already combined with the major bits.
pub mod audio_video {
    pub const UNCATEGORIZED: u32 = 0x0400;
    pub const WEARABLE_HEADSET: u32 = 0x0404;
    pub const HANDSFREE: u32 = 0x0408;
    pub const MICROPHONE: u32 = 0x0410;
    pub const LOUDSPEAKER: u32 = 0x0414;
    pub const HEADPHONES: u32 = 0x0418;
    pub const PORTABLE_AUDIO: u32 = 0x041C;
    pub const CAR_AUDIO: u32 = 0x0420;
    pub const SET_TOP_BOX: u32 = 0x0424;
    pub const HIFI_AUDIO: u32 = 0x0428;
    pub const VCR: u32 = 0x042C;
    pub const VIDEO_CAMERA: u32 = 0x0430;
    pub const CAMCORDER: u32 = 0x0434;
    pub const VIDEO_MONITOR: u32 = 0x0438;
    pub const VIDEO_DISPLAY_AND_LOUDSPEAKER: u32 = 0x043C;
    pub const VIDEO_CONFERENCING: u32 = 0x0440;
    pub const VIDEO_GAMING_TOY: u32 = 0x0448;
}

/// Raw 24-bit Class of Device as reported in `Device1.Class`. Service bits
/// are kept but ignored by the accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DeviceClass(u32);

impl DeviceClass {
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn major(self) -> u32 {
        self.0 & MAJOR_MASK
    }

    /// Major and minor bits together, comparable with the `audio_video` codes.
    pub fn device(self) -> u32 {
        self.0 & DEVICE_MASK
    }
}
