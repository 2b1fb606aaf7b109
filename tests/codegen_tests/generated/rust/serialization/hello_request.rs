// Code generated by pdlkit from schema `demo.chat`. DO NOT EDIT.
// Chat protocol
// Version 1

use pdlkit::wire::message::{read_repeated, write_repeated};
use pdlkit::wire::WireValue as _;

use super::super::types::*;

impl pdlkit::wire::WireMessage for HelloRequest {
    const TYPE_NAME: &'static str = "demo.chat.HelloRequest";
    const TYPE_TAG: i32 = -2145361647;
    const FIELD_COUNT: usize = 2;

    fn mark_present(&self, mask: &mut pdlkit::wire::PresenceMask) {
        mask.set_if(0, !self.name.is_default());
        mask.set_if(1, !self.lucky.is_empty());
    }

    fn write_present(&self, mask: &pdlkit::wire::PresenceMask, w: &mut pdlkit::wire::WireWriter) -> pdlkit::Result<()> {
        if mask.is_set(0) {
            self.name.write_to(w)?;
        }
        if mask.is_set(1) {
            write_repeated(&self.lucky, w)?;
        }
        Ok(())
    }

    fn read_present(&mut self, mask: &pdlkit::wire::PresenceMask, r: &mut pdlkit::wire::WireReader<'_>) -> pdlkit::Result<()> {
        if mask.is_set(0) {
            self.name = pdlkit::wire::WireValue::read_from(r)?;
        }
        if mask.is_set(1) {
            self.lucky = read_repeated(r)?;
        }
        Ok(())
    }
}
