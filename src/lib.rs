pub mod error;
pub mod frame;

pub mod common {
    pub mod address;
}

pub mod gear {
    pub mod address;
    pub mod cmd_defs;
}

pub mod device {
    pub mod address;
    pub mod cmd_defs;
}

pub mod command;
pub mod response;

pub mod sequence;

pub mod drivers;

pub mod utils {
    pub mod address_set;
    pub mod memory_banks;
}
