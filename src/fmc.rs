//! Captain FMC/CDU panel: keys, annunciators and screen.

use log::debug;
use panel_core::{
    BoardItem, CallbackError, CallbackRegistry, DataDescriptor, Descriptor, HardwareInterface, ReadDescriptor,
    SimRead, Value, WriteDescriptor, CDU_SCREEN_FIELD, CDU_SCREEN_PARSER,
};
use panel_proto::pmdg;
use panel_proto::{ElementType, Field, FieldValue, Layout, PmdgGlyphs, SCREEN_SIZE};

pub const VENDOR_ID: u16 = 0x04D8;
pub const PRODUCT_ID: u16 = 0xE6D6;

/// Sim-read callback that logs the decoded CDU screen.
pub const SCREEN_LOG_CALLBACK: &str = "cdu-screen-log";

/// `(item id, event, pin)` for each key.
const KEYS: &[(&str, u32, u16)] = &[
    ("key_l1", pmdg::EVT_CDU_L_L1, 0),
    ("key_r1", pmdg::EVT_CDU_L_R1, 1),
    ("key_init_ref", pmdg::EVT_CDU_L_INIT_REF, 2),
    ("key_menu", pmdg::EVT_CDU_L_MENU, 3),
    ("key_exec", pmdg::EVT_CDU_L_EXEC, 4),
    ("key_prev_page", pmdg::EVT_CDU_L_PREV_PAGE, 5),
    ("key_next_page", pmdg::EVT_CDU_L_NEXT_PAGE, 6),
    ("key_clr", pmdg::EVT_CDU_L_CLR, 7),
];

/// `(item id, data field, pin)` for each annunciator.
const ANNUNCIATORS: &[(&str, &str, u16)] = &[
    ("annun_exec", "CDU_annunEXEC", 32),
    ("annun_call", "CDU_annunCALL", 33),
    ("annun_fail", "CDU_annunFAIL", 34),
    ("annun_msg", "CDU_annunMSG", 35),
    ("annun_ofst", "CDU_annunOFST", 36),
];

const DATA_HANDLE: u32 = 1;
const SCREEN_HANDLE: u32 = 2;
const READ_HANDLE_BASE: u32 = 100;
const KEY_HANDLE_BASE: u32 = 200;

/// Demo layout holding only the CDU fields of the NG3 data area, packed
/// from offset 0. It matches what [`crate::MockSimulator`] broadcasts, not
/// the field offsets of the real SDK struct. Index 0 is the captain side.
pub fn cdu_layout() -> Layout {
    let mut fields: Vec<Field> = ANNUNCIATORS
        .iter()
        .map(|&(_, name, _)| Field::new(name, ElementType::Boolean).repeat(2))
        .collect();
    fields.push(Field::new("CDU_BrtKnob", ElementType::Char).repeat(2));
    Layout::new(fields)
}

/// Board items for the captain CDU.
pub fn board_items() -> Vec<BoardItem> {
    let mut items = vec![
        BoardItem::new("ng3_data").sim(Descriptor::new(
            pmdg::DATA_NAME,
            DATA_HANDLE,
            DataDescriptor::new(pmdg::DATA_NAME, pmdg::DATA_ID, pmdg::DATA_DEFINITION, 0)
                .layout(cdu_layout())
                .update_on_change(false),
        )),
        BoardItem::new("cdu_data")
            .sim(Descriptor::new(
                "cdu_SCREEN",
                SCREEN_HANDLE,
                DataDescriptor::new(pmdg::CDU_0_NAME, pmdg::CDU_0_ID, pmdg::CDU_0_DEFINITION, SCREEN_SIZE)
                    .parser(CDU_SCREEN_PARSER),
            ))
            .on_sim_read(SCREEN_LOG_CALLBACK),
        BoardItem::new("cdu_screen").sim(Descriptor::new(
            "cdu_screen",
            READ_HANDLE_BASE,
            ReadDescriptor::new(CDU_SCREEN_FIELD),
        )),
    ];

    for (n, &(id, field, pin)) in (1..).zip(ANNUNCIATORS) {
        items.push(
            BoardItem::new(id)
                .interface(HardwareInterface::led(id, pin))
                .sim(Descriptor::new(id, READ_HANDLE_BASE + n, ReadDescriptor::new(field).at(0))),
        );
    }

    for (n, &(id, event, pin)) in (0..).zip(KEYS) {
        items.push(
            BoardItem::new(id)
                .interface(HardwareInterface::button(id, pin))
                .sim(Descriptor::new(id, KEY_HANDLE_BASE + n, WriteDescriptor::new(event))),
        );
    }
    items
}

/// Install the callbacks [`board_items`] refers to.
pub fn install_callbacks(callbacks: &CallbackRegistry) {
    callbacks.register_sim_read(SCREEN_LOG_CALLBACK, log_screen);
}

fn log_screen(ctx: &SimRead<'_>) -> Result<(), CallbackError> {
    let Value::Record(record) = ctx.value else {
        return Err(CallbackError::new("expected a decoded screen"));
    };
    let Some(FieldValue::Screen(screen)) = record.get(CDU_SCREEN_FIELD) else {
        return Err(CallbackError::new("no screen in record"));
    };
    if !screen.powered {
        debug!("{}: CDU unpowered", ctx.board);
        return Ok(());
    }
    for line in screen.lines(&PmdgGlyphs) {
        debug!("{}: |{}|", ctx.board, line);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use panel_core::DescriptorTag;

    #[test]
    fn test_layout_size() {
        assert_eq!(cdu_layout().size(), 12);
    }

    #[test]
    fn test_items_unique() {
        let items = board_items();
        let mut ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), items.len());
        assert_eq!(items.len(), 3 + ANNUNCIATORS.len() + KEYS.len());

        let mut handles: Vec<u32> = items.iter().filter_map(|i| i.sim.as_ref()).map(|d| d.handle).collect();
        handles.sort_unstable();
        handles.dedup();
        assert_eq!(handles.len(), items.len());
    }

    #[test]
    fn test_keys_write_events() {
        let items = board_items();
        let exec = items.iter().find(|i| i.id == "key_exec").unwrap();
        let write = exec.sim.as_ref().and_then(Descriptor::as_write).unwrap();
        assert_eq!(write.event, pmdg::EVT_CDU_L_EXEC);
        assert_eq!(exec.sim.as_ref().unwrap().tag(), DescriptorTag::Write);
    }

    #[test]
    fn test_log_screen_rejects_raw_value() {
        let callbacks = CallbackRegistry::new();
        install_callbacks(&callbacks);
        let descriptor = Descriptor::new("x", 1, ReadDescriptor::new("y"));
        let actions = panel_core::Actions::new();
        let ctx = SimRead {
            board: "fmc",
            item: "cdu_data",
            descriptor: &descriptor,
            value: &Value::Int(1),
            actions: &actions,
        };
        let callback = callbacks.sim_read(SCREEN_LOG_CALLBACK).unwrap();
        assert!(callback(&ctx).is_err());
    }
}
