//! Message layouts of QuakeWorld protocol 28.
//!
//! The codec only needs to know where each message ends, so every function
//! here walks a message body and returns its length without building
//! anything.  `None` means the message id is not part of the base protocol
//! or the body is truncated.
//!
//! Coordinates are 16-bit, angles are 8-bit except inside usercmds where
//! they are 16-bit.

/// Protocol version announced in `svc_serverdata`.
pub const PROTOCOL_VERSION: i32 = 28;

/// Server-to-client message ids.
pub mod svc {
    pub const NOP: u8 = 1;
    pub const DISCONNECT: u8 = 2;
    pub const UPDATESTAT: u8 = 3;
    pub const SOUND: u8 = 6;
    pub const PRINT: u8 = 8;
    pub const STUFFTEXT: u8 = 9;
    pub const SETANGLE: u8 = 10;
    pub const SERVERDATA: u8 = 11;
    pub const LIGHTSTYLE: u8 = 12;
    pub const UPDATEFRAGS: u8 = 14;
    pub const STOPSOUND: u8 = 16;
    pub const DAMAGE: u8 = 19;
    pub const SPAWNSTATIC: u8 = 20;
    pub const SPAWNBASELINE: u8 = 22;
    pub const TEMP_ENTITY: u8 = 23;
    pub const SETPAUSE: u8 = 24;
    pub const CENTERPRINT: u8 = 26;
    pub const KILLEDMONSTER: u8 = 27;
    pub const FOUNDSECRET: u8 = 28;
    pub const SPAWNSTATICSOUND: u8 = 29;
    pub const INTERMISSION: u8 = 30;
    pub const FINALE: u8 = 31;
    pub const CDTRACK: u8 = 32;
    pub const SELLSCREEN: u8 = 33;
    pub const SMALLKICK: u8 = 34;
    pub const BIGKICK: u8 = 35;
    pub const UPDATEPING: u8 = 36;
    pub const UPDATEENTERTIME: u8 = 37;
    pub const UPDATESTATLONG: u8 = 38;
    pub const MUZZLEFLASH: u8 = 39;
    pub const UPDATEUSERINFO: u8 = 40;
    pub const DOWNLOAD: u8 = 41;
    pub const PLAYERINFO: u8 = 42;
    pub const NAILS: u8 = 43;
    pub const CHOKECOUNT: u8 = 44;
    pub const MODELLIST: u8 = 45;
    pub const SOUNDLIST: u8 = 46;
    pub const PACKETENTITIES: u8 = 47;
    pub const DELTAPACKETENTITIES: u8 = 48;
    pub const MAXSPEED: u8 = 49;
    pub const ENTGRAVITY: u8 = 50;
    pub const SETINFO: u8 = 51;
    pub const SERVERINFO: u8 = 52;
    pub const UPDATEPL: u8 = 53;
}

/// Client-to-server message ids.
pub mod clc {
    pub const NOP: u8 = 1;
    pub const MOVE: u8 = 3;
    pub const STRINGCMD: u8 = 4;
    pub const DELTA: u8 = 5;
    pub const TMOVE: u8 = 6;
    pub const UPLOAD: u8 = 7;
}

/// `svc_temp_entity` kinds.
mod te {
    pub const SPIKE: u8 = 0;
    pub const SUPERSPIKE: u8 = 1;
    pub const GUNSHOT: u8 = 2;
    pub const EXPLOSION: u8 = 3;
    pub const TAREXPLOSION: u8 = 4;
    pub const LIGHTNING1: u8 = 5;
    pub const LIGHTNING2: u8 = 6;
    pub const WIZSPIKE: u8 = 7;
    pub const KNIGHTSPIKE: u8 = 8;
    pub const LIGHTNING3: u8 = 9;
    pub const LAVASPLASH: u8 = 10;
    pub const TELEPORT: u8 = 11;
    pub const BLOOD: u8 = 12;
    pub const LIGHTNINGBLOOD: u8 = 13;
}

const COORD: usize = 2;
const ANGLE: usize = 1;
const POSITION: usize = 3 * COORD;

// Delta-compressed usercmd field flags (clc_move, svc_playerinfo).
pub(crate) const CM_ANGLE1: u8 = 1 << 0;
pub(crate) const CM_ANGLE3: u8 = 1 << 1;
pub(crate) const CM_FORWARD: u8 = 1 << 2;
pub(crate) const CM_SIDE: u8 = 1 << 3;
pub(crate) const CM_UP: u8 = 1 << 4;
pub(crate) const CM_BUTTONS: u8 = 1 << 5;
pub(crate) const CM_IMPULSE: u8 = 1 << 6;
pub(crate) const CM_ANGLE2: u8 = 1 << 7;

// svc_playerinfo flags.
const PF_MSEC: u16 = 1 << 0;
const PF_COMMAND: u16 = 1 << 1;
const PF_VELOCITY1: u16 = 1 << 2;
const PF_VELOCITY2: u16 = 1 << 3;
const PF_VELOCITY3: u16 = 1 << 4;
const PF_MODEL: u16 = 1 << 5;
const PF_SKINNUM: u16 = 1 << 6;
const PF_EFFECTS: u16 = 1 << 7;
const PF_WEAPONFRAME: u16 = 1 << 8;

// Entity delta flags.  The low 9 bits of the first word are the entity
// number; U_MOREBITS pulls in another byte of flags for those bits.
const U_ENTITY_MASK: u16 = 511;
const U_ORIGIN1: u16 = 1 << 9;
const U_ORIGIN2: u16 = 1 << 10;
const U_ORIGIN3: u16 = 1 << 11;
const U_ANGLE2: u16 = 1 << 12;
const U_FRAME: u16 = 1 << 13;
const U_REMOVE: u16 = 1 << 14;
const U_MOREBITS: u16 = 1 << 15;
const U_ANGLE1: u16 = 1 << 0;
const U_ANGLE3: u16 = 1 << 1;
const U_MODEL: u16 = 1 << 2;
const U_COLORMAP: u16 = 1 << 3;
const U_SKIN: u16 = 1 << 4;
const U_EFFECTS: u16 = 1 << 5;

// svc_sound channel flags.
const SND_VOLUME: u16 = 1 << 15;
const SND_ATTENUATION: u16 = 1 << 14;

/// Bounds-checked cursor over a message body.
struct Scan<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Scan<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn skip(&mut self, n: usize) -> Option<()> {
        let end = self.pos.checked_add(n)?;
        if end > self.buf.len() {
            return None;
        }
        self.pos = end;
        Some(())
    }

    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.buf.get(self.pos..self.pos.checked_add(N)?)?;
        self.pos += N;
        bytes.try_into().ok()
    }

    fn u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn u16(&mut self) -> Option<u16> {
        self.take().map(u16::from_le_bytes)
    }

    fn i16(&mut self) -> Option<i16> {
        self.take().map(i16::from_le_bytes)
    }

    fn i32(&mut self) -> Option<i32> {
        self.take().map(i32::from_le_bytes)
    }

    /// Skip a null-terminated string and return it without the terminator.
    fn string(&mut self) -> Option<&'a [u8]> {
        let rest = self.buf.get(self.pos..)?;
        let end = rest.iter().position(|&b| b == 0)?;
        self.pos += end + 1;
        Some(&rest[..end])
    }
}

/// Total length of the server message at the start of `msg`, id included.
pub(crate) fn svc_message_len(msg: &[u8]) -> Option<usize> {
    let (&id, body) = msg.split_first()?;
    let mut s = Scan::new(body);

    match id {
        svc::NOP
        | svc::DISCONNECT
        | svc::KILLEDMONSTER
        | svc::FOUNDSECRET
        | svc::SELLSCREEN
        | svc::SMALLKICK
        | svc::BIGKICK => {}
        svc::SETPAUSE | svc::CDTRACK | svc::CHOKECOUNT => s.skip(1)?,
        svc::UPDATESTAT | svc::UPDATEPL | svc::STOPSOUND | svc::MUZZLEFLASH => s.skip(2)?,
        svc::UPDATEFRAGS | svc::UPDATEPING => s.skip(3)?,
        svc::SETANGLE => s.skip(3 * ANGLE)?,
        svc::MAXSPEED | svc::ENTGRAVITY => s.skip(4)?,
        svc::UPDATEENTERTIME | svc::UPDATESTATLONG => s.skip(5)?,
        svc::DAMAGE => s.skip(2 + POSITION)?,
        svc::SPAWNSTATICSOUND => s.skip(POSITION + 3)?,
        svc::INTERMISSION => s.skip(POSITION + 3 * ANGLE)?,
        svc::SPAWNSTATIC => baseline(&mut s)?,
        svc::SPAWNBASELINE => {
            s.skip(2)?;
            baseline(&mut s)?;
        }
        svc::STUFFTEXT | svc::CENTERPRINT | svc::FINALE => {
            s.string()?;
        }
        svc::PRINT | svc::LIGHTSTYLE => {
            s.skip(1)?;
            s.string()?;
        }
        svc::UPDATEUSERINFO => {
            s.skip(5)?;
            s.string()?;
        }
        svc::SETINFO => {
            s.skip(1)?;
            s.string()?;
            s.string()?;
        }
        svc::SERVERINFO => {
            s.string()?;
            s.string()?;
        }
        svc::SERVERDATA => serverdata(&mut s)?,
        svc::SOUND => sound(&mut s)?,
        svc::TEMP_ENTITY => temp_entity(&mut s)?,
        svc::DOWNLOAD => download(&mut s)?,
        svc::PLAYERINFO => playerinfo(&mut s)?,
        svc::NAILS => {
            let count = s.u8()?;
            s.skip(usize::from(count) * 6)?;
        }
        svc::MODELLIST | svc::SOUNDLIST => name_list(&mut s)?,
        svc::PACKETENTITIES => packet_entities(&mut s)?,
        svc::DELTAPACKETENTITIES => {
            s.skip(1)?;
            packet_entities(&mut s)?;
        }
        _ => return None,
    }

    Some(1 + s.pos)
}

/// Total length of the client message at the start of `msg`, id included.
pub(crate) fn clc_message_len(msg: &[u8]) -> Option<usize> {
    let (&id, body) = msg.split_first()?;
    let mut s = Scan::new(body);

    match id {
        clc::NOP => {}
        clc::STRINGCMD => {
            s.string()?;
        }
        clc::DELTA => s.skip(1)?,
        clc::TMOVE => s.skip(POSITION)?,
        clc::MOVE => {
            // checksum, packet loss, then the last three usercmds
            s.skip(2)?;
            for _ in 0..3 {
                usercmd(&mut s)?;
            }
        }
        clc::UPLOAD => {
            let size = usize::try_from(s.i16()?).ok()?;
            s.skip(1 + size)?;
        }
        _ => return None,
    }

    Some(1 + s.pos)
}

/// Delta-compressed usercmd: flag byte, flagged fields, msec.
fn usercmd(s: &mut Scan) -> Option<()> {
    let bits = s.u8()?;
    let mut len = 1;
    for (flag, size) in [
        (CM_ANGLE1, 2),
        (CM_ANGLE2, 2),
        (CM_ANGLE3, 2),
        (CM_FORWARD, 2),
        (CM_SIDE, 2),
        (CM_UP, 2),
        (CM_BUTTONS, 1),
        (CM_IMPULSE, 1),
    ] {
        if bits & flag != 0 {
            len += size;
        }
    }
    s.skip(len)
}

/// Model, frame, colormap, skin, then origin and angles.
fn baseline(s: &mut Scan) -> Option<()> {
    s.skip(4 + 3 * (COORD + ANGLE))
}

fn serverdata(s: &mut Scan) -> Option<()> {
    // Extended protocols change other layouts too; leave them opaque.
    if s.i32()? != PROTOCOL_VERSION {
        return None;
    }
    s.skip(4)?; // servercount
    s.string()?; // gamedir
    s.skip(1)?; // player number
    s.string()?; // level name
    s.skip(10 * 4) // movevars
}

fn sound(s: &mut Scan) -> Option<()> {
    let channel = s.u16()?;
    if channel & SND_VOLUME != 0 {
        s.skip(1)?;
    }
    if channel & SND_ATTENUATION != 0 {
        s.skip(1)?;
    }
    s.skip(1 + POSITION)
}

fn temp_entity(s: &mut Scan) -> Option<()> {
    match s.u8()? {
        te::SPIKE
        | te::SUPERSPIKE
        | te::EXPLOSION
        | te::TAREXPLOSION
        | te::WIZSPIKE
        | te::KNIGHTSPIKE
        | te::LAVASPLASH
        | te::TELEPORT
        | te::LIGHTNINGBLOOD => s.skip(POSITION),
        te::GUNSHOT | te::BLOOD => s.skip(1 + POSITION),
        te::LIGHTNING1 | te::LIGHTNING2 | te::LIGHTNING3 => s.skip(2 + 2 * POSITION),
        _ => None,
    }
}

fn download(s: &mut Scan) -> Option<()> {
    let size = s.i16()?;
    s.skip(1)?; // percent
    match size {
        -1 => Some(()),
        n => s.skip(usize::try_from(n).ok()?),
    }
}

fn playerinfo(s: &mut Scan) -> Option<()> {
    s.skip(1)?; // player number
    let flags = s.u16()?;
    s.skip(POSITION + 1)?; // origin, frame

    if flags & PF_MSEC != 0 {
        s.skip(1)?;
    }
    if flags & PF_COMMAND != 0 {
        usercmd(s)?;
    }
    for flag in [PF_VELOCITY1, PF_VELOCITY2, PF_VELOCITY3] {
        if flags & flag != 0 {
            s.skip(2)?;
        }
    }
    for flag in [PF_MODEL, PF_SKINNUM, PF_EFFECTS, PF_WEAPONFRAME] {
        if flags & flag != 0 {
            s.skip(1)?;
        }
    }
    Some(())
}

/// `svc_modellist` / `svc_soundlist`: start index, names up to an empty
/// one, next start index.
fn name_list(s: &mut Scan) -> Option<()> {
    s.skip(1)?;
    while !s.string()?.is_empty() {}
    s.skip(1)
}

/// Entity deltas up to a zero word.
fn packet_entities(s: &mut Scan) -> Option<()> {
    loop {
        let word = s.u16()?;
        if word == 0 {
            return Some(());
        }
        if word & U_REMOVE != 0 {
            continue;
        }

        let mut bits = word & !U_ENTITY_MASK;
        if bits & U_MOREBITS != 0 {
            bits |= u16::from(s.u8()?);
        }

        let mut len = 0;
        for (flag, size) in [
            (U_MODEL, 1),
            (U_FRAME, 1),
            (U_COLORMAP, 1),
            (U_SKIN, 1),
            (U_EFFECTS, 1),
            (U_ORIGIN1, COORD),
            (U_ORIGIN2, COORD),
            (U_ORIGIN3, COORD),
            (U_ANGLE1, ANGLE),
            (U_ANGLE2, ANGLE),
            (U_ANGLE3, ANGLE),
        ] {
            if bits & flag != 0 {
                len += size;
            }
        }
        s.skip(len)?;
    }
}
