//! Well-known opcodes.
//!
//! Only the generic and motor messages a typical stage controller exchanges
//! are listed. Opcodes are opaque `u16` values to the codec; any value may be
//! encoded or decoded whether it appears here or not.

pub const MOD_IDENTIFY: u16 = 0x0223;
pub const MOD_SET_CHANENABLESTATE: u16 = 0x0210;
pub const MOD_REQ_CHANENABLESTATE: u16 = 0x0211;
pub const MOD_GET_CHANENABLESTATE: u16 = 0x0212;

pub const HW_DISCONNECT: u16 = 0x0002;
pub const HW_REQ_INFO: u16 = 0x0005;
pub const HW_GET_INFO: u16 = 0x0006;
pub const HW_START_UPDATEMSGS: u16 = 0x0011;
pub const HW_STOP_UPDATEMSGS: u16 = 0x0012;
pub const HW_RESPONSE: u16 = 0x0080;
pub const HW_RICHRESPONSE: u16 = 0x0081;

pub const MOT_REQ_POSCOUNTER: u16 = 0x0411;
pub const MOT_GET_POSCOUNTER: u16 = 0x0412;
pub const MOT_SET_VELPARAMS: u16 = 0x0413;
pub const MOT_REQ_VELPARAMS: u16 = 0x0414;
pub const MOT_GET_VELPARAMS: u16 = 0x0415;
pub const MOT_SET_HOMEPARAMS: u16 = 0x0440;
pub const MOT_REQ_HOMEPARAMS: u16 = 0x0441;
pub const MOT_GET_HOMEPARAMS: u16 = 0x0442;
pub const MOT_MOVE_HOME: u16 = 0x0443;
pub const MOT_MOVE_HOMED: u16 = 0x0444;
pub const MOT_MOVE_RELATIVE: u16 = 0x0448;
pub const MOT_MOVE_ABSOLUTE: u16 = 0x0453;
pub const MOT_MOVE_COMPLETED: u16 = 0x0464;
pub const MOT_MOVE_STOP: u16 = 0x0465;
pub const MOT_MOVE_STOPPED: u16 = 0x0466;
pub const MOT_SUSPEND_ENDOFMOVEMSGS: u16 = 0x046B;
pub const MOT_RESUME_ENDOFMOVEMSGS: u16 = 0x046C;
pub const MOT_REQ_DCSTATUSUPDATE: u16 = 0x0490;
pub const MOT_GET_DCSTATUSUPDATE: u16 = 0x0491;
pub const MOT_ACK_DCSTATUSUPDATE: u16 = 0x0492;

/// All named opcodes, in ascending order.
pub const KNOWN: &[(u16, &str)] = &[
    (HW_DISCONNECT, "HW_DISCONNECT"),
    (HW_REQ_INFO, "HW_REQ_INFO"),
    (HW_GET_INFO, "HW_GET_INFO"),
    (HW_START_UPDATEMSGS, "HW_START_UPDATEMSGS"),
    (HW_STOP_UPDATEMSGS, "HW_STOP_UPDATEMSGS"),
    (HW_RESPONSE, "HW_RESPONSE"),
    (HW_RICHRESPONSE, "HW_RICHRESPONSE"),
    (MOD_SET_CHANENABLESTATE, "MOD_SET_CHANENABLESTATE"),
    (MOD_REQ_CHANENABLESTATE, "MOD_REQ_CHANENABLESTATE"),
    (MOD_GET_CHANENABLESTATE, "MOD_GET_CHANENABLESTATE"),
    (MOD_IDENTIFY, "MOD_IDENTIFY"),
    (MOT_REQ_POSCOUNTER, "MOT_REQ_POSCOUNTER"),
    (MOT_GET_POSCOUNTER, "MOT_GET_POSCOUNTER"),
    (MOT_SET_VELPARAMS, "MOT_SET_VELPARAMS"),
    (MOT_REQ_VELPARAMS, "MOT_REQ_VELPARAMS"),
    (MOT_GET_VELPARAMS, "MOT_GET_VELPARAMS"),
    (MOT_SET_HOMEPARAMS, "MOT_SET_HOMEPARAMS"),
    (MOT_REQ_HOMEPARAMS, "MOT_REQ_HOMEPARAMS"),
    (MOT_GET_HOMEPARAMS, "MOT_GET_HOMEPARAMS"),
    (MOT_MOVE_HOME, "MOT_MOVE_HOME"),
    (MOT_MOVE_HOMED, "MOT_MOVE_HOMED"),
    (MOT_MOVE_RELATIVE, "MOT_MOVE_RELATIVE"),
    (MOT_MOVE_ABSOLUTE, "MOT_MOVE_ABSOLUTE"),
    (MOT_MOVE_COMPLETED, "MOT_MOVE_COMPLETED"),
    (MOT_MOVE_STOP, "MOT_MOVE_STOP"),
    (MOT_MOVE_STOPPED, "MOT_MOVE_STOPPED"),
    (MOT_SUSPEND_ENDOFMOVEMSGS, "MOT_SUSPEND_ENDOFMOVEMSGS"),
    (MOT_RESUME_ENDOFMOVEMSGS, "MOT_RESUME_ENDOFMOVEMSGS"),
    (MOT_REQ_DCSTATUSUPDATE, "MOT_REQ_DCSTATUSUPDATE"),
    (MOT_GET_DCSTATUSUPDATE, "MOT_GET_DCSTATUSUPDATE"),
    (MOT_ACK_DCSTATUSUPDATE, "MOT_ACK_DCSTATUSUPDATE"),
];

/// Returns the name of a well-known opcode.
pub fn opcode_name(opcode: u16) -> Option<&'static str> {
    KNOWN
        .binary_search_by_key(&opcode, |&(code, _)| code)
        .ok()
        .map(|idx| KNOWN[idx].1)
}

/// Looks up a well-known opcode by name, with or without the `MGMSG_` prefix.
pub fn opcode_by_name(name: &str) -> Option<u16> {
    let name = name.strip_prefix("MGMSG_").unwrap_or(name);
    KNOWN
        .iter()
        .find(|(_, known)| known.eq_ignore_ascii_case(name))
        .map(|&(code, _)| code)
}
