//! Identifiers from the PMDG 737 NG3 SDK.
//!
//! Client data areas are requested by name and mapped to the fixed ids
//! below; custom events are offsets from [`THIRD_PARTY_EVENT_ID_MIN`].

pub const DATA_NAME: &str = "PMDG_NG3_Data";
pub const DATA_ID: u32 = 0x4E47_3331;
pub const DATA_DEFINITION: u32 = 0x4E47_3332;

pub const CONTROL_NAME: &str = "PMDG_NG3_Control";
pub const CONTROL_ID: u32 = 0x4E47_3333;
pub const CONTROL_DEFINITION: u32 = 0x4E47_3334;

pub const CDU_0_NAME: &str = "PMDG_NG3_CDU_0";
pub const CDU_1_NAME: &str = "PMDG_NG3_CDU_1";
pub const CDU_0_ID: u32 = 0x4E47_3335;
pub const CDU_1_ID: u32 = 0x4E47_3336;
pub const CDU_0_DEFINITION: u32 = 0x4E47_3338;
pub const CDU_1_DEFINITION: u32 = 0x4E47_3339;

pub const THIRD_PARTY_EVENT_ID_MIN: u32 = 0x0001_1000;

/// Custom event id `n` slots above the third-party base.
#[inline]
#[must_use]
pub const fn event(n: u32) -> u32 {
    THIRD_PARTY_EVENT_ID_MIN + n
}

// Captain CDU keys.
pub const EVT_CDU_L_L1: u32 = event(534);
pub const EVT_CDU_L_R1: u32 = event(540);
pub const EVT_CDU_L_INIT_REF: u32 = event(546);
pub const EVT_CDU_L_MENU: u32 = event(551);
pub const EVT_CDU_L_EXEC: u32 = event(556);
pub const EVT_CDU_L_PREV_PAGE: u32 = event(559);
pub const EVT_CDU_L_NEXT_PAGE: u32 = event(560);
pub const EVT_CDU_L_CLR: u32 = event(602);

pub const EVT_OH_ELEC_BATTERY_SWITCH: u32 = event(1);
