//! Per-frame transmission options, packed into a small bit set so
//! they can be combined with `|`.

const PRIORITY_MASK: u16 = 0x07;
const SEND_TWICE_BIT: u16 = 0x08;
const EXPECT_ANSWER_BIT: u16 = 0x10;

pub const PRIORITY_1: Flags = Priority(1);
pub const PRIORITY_2: Flags = Priority(2);
pub const PRIORITY_3: Flags = Priority(3);
pub const PRIORITY_4: Flags = Priority(4);
pub const PRIORITY_5: Flags = Priority(5);
pub const EXPECT_ANSWER: Flags = ExpectAnswer(true);
pub const SEND_TWICE: Flags = SendTwice(true);
pub const NO_FLAG: Flags = Combined(0);
pub const PRIORITY_DEFAULT: Flags = PRIORITY_5;

#[derive(Debug, Clone)]
pub enum Flags {
    Empty,
    Priority(u8),
    SendTwice(bool),
    ExpectAnswer(bool),
    Combined(u16),
}

use Flags::*;

impl Flags {
    pub const fn empty() -> Flags {
        Empty
    }

    const fn bits(&self) -> u16 {
        match *self {
            Empty => 0,
            Priority(p) => p as u16 & PRIORITY_MASK,
            SendTwice(s) => {
                if s {
                    SEND_TWICE_BIT
                } else {
                    0
                }
            }
            ExpectAnswer(e) => {
                if e {
                    EXPECT_ANSWER_BIT
                } else {
                    0
                }
            }
            Combined(b) => b,
        }
    }

    /// Bits in the combined value that this flag overrides.
    const fn field(&self) -> u16 {
        match self {
            Empty | Combined(_) => 0,
            Priority(_) => PRIORITY_MASK,
            SendTwice(_) => SEND_TWICE_BIT,
            ExpectAnswer(_) => EXPECT_ANSWER_BIT,
        }
    }

    pub const fn send_twice(&self) -> bool {
        self.bits() & SEND_TWICE_BIT != 0
    }

    pub const fn expect_answer(&self) -> bool {
        self.bits() & EXPECT_ANSWER_BIT != 0
    }

    pub fn priority(&self) -> u8 {
        let p = (self.bits() & PRIORITY_MASK) as u8;
        if (1..=5).contains(&p) {
            p
        } else {
            5
        }
    }
}

impl PartialEq for Flags {
    fn eq(&self, other: &Flags) -> bool {
        self.bits() == other.bits()
    }
}

impl std::ops::BitOr<Flags> for Flags {
    type Output = Flags;
    fn bitor(self, other: Flags) -> Flags {
        Combined(self.bits() & !other.field() | other.bits())
    }
}

impl std::ops::BitOrAssign<Flags> for Flags {
    fn bitor_assign(&mut self, other: Flags) {
        *self = self.clone() | other;
    }
}
