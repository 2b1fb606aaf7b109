//! Hand-written message types covering every field shape

use pdlkit::wire::message::{
    read_nested, read_repeated, read_repeated_nested, write_nested, write_repeated,
    write_repeated_nested,
};
use pdlkit::wire::{
    PresenceMask, Timestamp, Vector3, WireMessage, WireReader, WireValue, WireWriter,
};
use pdlkit::Result;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl WireMessage for Point {
    const TYPE_NAME: &'static str = "test.Point";
    const TYPE_TAG: i32 = 0x5a5a_0001;
    const FIELD_COUNT: usize = 2;

    fn mark_present(&self, mask: &mut PresenceMask) {
        mask.set_if(0, !self.x.is_default());
        mask.set_if(1, !self.y.is_default());
    }

    fn write_present(&self, mask: &PresenceMask, w: &mut WireWriter) -> Result<()> {
        if mask.is_set(0) {
            self.x.write_to(w)?;
        }
        if mask.is_set(1) {
            self.y.write_to(w)?;
        }
        Ok(())
    }

    fn read_present(&mut self, mask: &PresenceMask, r: &mut WireReader<'_>) -> Result<()> {
        if mask.is_set(0) {
            self.x = WireValue::read_from(r)?;
        }
        if mask.is_set(1) {
            self.y = WireValue::read_from(r)?;
        }
        Ok(())
    }
}

/// One field of every kind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sample {
    pub id: i32,
    pub big: i64,
    pub ratio: f32,
    pub score: f64,
    pub flag: bool,
    pub name: String,
    pub pos: Vector3,
    pub at: Timestamp,
    pub tags: Vec<String>,
    pub origin: Option<Box<Point>>,
    pub path: Vec<Point>,
}

impl WireMessage for Sample {
    const TYPE_NAME: &'static str = "test.Sample";
    const TYPE_TAG: i32 = 0x5a5a_0002;
    const FIELD_COUNT: usize = 11;

    fn mark_present(&self, mask: &mut PresenceMask) {
        mask.set_if(0, !self.id.is_default());
        mask.set_if(1, !self.big.is_default());
        mask.set_if(2, !self.ratio.is_default());
        mask.set_if(3, !self.score.is_default());
        mask.set_if(4, !self.flag.is_default());
        mask.set_if(5, !self.name.is_default());
        mask.set_if(6, !self.pos.is_default());
        mask.set_if(7, !self.at.is_default());
        mask.set_if(8, !self.tags.is_empty());
        mask.set_if(9, self.origin.is_some());
        mask.set_if(10, !self.path.is_empty());
    }

    fn write_present(&self, mask: &PresenceMask, w: &mut WireWriter) -> Result<()> {
        if mask.is_set(0) {
            self.id.write_to(w)?;
        }
        if mask.is_set(1) {
            self.big.write_to(w)?;
        }
        if mask.is_set(2) {
            self.ratio.write_to(w)?;
        }
        if mask.is_set(3) {
            self.score.write_to(w)?;
        }
        if mask.is_set(4) {
            self.flag.write_to(w)?;
        }
        if mask.is_set(5) {
            self.name.write_to(w)?;
        }
        if mask.is_set(6) {
            self.pos.write_to(w)?;
        }
        if mask.is_set(7) {
            self.at.write_to(w)?;
        }
        if mask.is_set(8) {
            write_repeated(&self.tags, w)?;
        }
        if mask.is_set(9) {
            write_nested(self.origin.as_deref(), w)?;
        }
        if mask.is_set(10) {
            write_repeated_nested(&self.path, w)?;
        }
        Ok(())
    }

    fn read_present(&mut self, mask: &PresenceMask, r: &mut WireReader<'_>) -> Result<()> {
        if mask.is_set(0) {
            self.id = WireValue::read_from(r)?;
        }
        if mask.is_set(1) {
            self.big = WireValue::read_from(r)?;
        }
        if mask.is_set(2) {
            self.ratio = WireValue::read_from(r)?;
        }
        if mask.is_set(3) {
            self.score = WireValue::read_from(r)?;
        }
        if mask.is_set(4) {
            self.flag = WireValue::read_from(r)?;
        }
        if mask.is_set(5) {
            self.name = WireValue::read_from(r)?;
        }
        if mask.is_set(6) {
            self.pos = WireValue::read_from(r)?;
        }
        if mask.is_set(7) {
            self.at = WireValue::read_from(r)?;
        }
        if mask.is_set(8) {
            self.tags = read_repeated(r)?;
        }
        if mask.is_set(9) {
            self.origin = read_nested::<Point>(r)?.map(Box::new);
        }
        if mask.is_set(10) {
            self.path = read_repeated_nested::<Point>(r)?;
        }
        Ok(())
    }
}

/// Forty int32 fields; spans two mask words
#[derive(Debug, Clone, PartialEq)]
pub struct Wide {
    pub values: [i32; 40],
}

impl Default for Wide {
    fn default() -> Self {
        Self { values: [0; 40] }
    }
}

impl WireMessage for Wide {
    const TYPE_NAME: &'static str = "test.Wide";
    const TYPE_TAG: i32 = 0x5a5a_0003;
    const FIELD_COUNT: usize = 40;

    fn mark_present(&self, mask: &mut PresenceMask) {
        for (i, value) in self.values.iter().enumerate() {
            mask.set_if(i, !value.is_default());
        }
    }

    fn write_present(&self, mask: &PresenceMask, w: &mut WireWriter) -> Result<()> {
        for (i, value) in self.values.iter().enumerate() {
            if mask.is_set(i) {
                value.write_to(w)?;
            }
        }
        Ok(())
    }

    fn read_present(&mut self, mask: &PresenceMask, r: &mut WireReader<'_>) -> Result<()> {
        for (i, value) in self.values.iter_mut().enumerate() {
            if mask.is_set(i) {
                *value = WireValue::read_from(r)?;
            }
        }
        Ok(())
    }
}

/// Same field layout as `Point` under a different tag
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Impostor {
    pub x: i32,
    pub y: i32,
}

impl WireMessage for Impostor {
    const TYPE_NAME: &'static str = "test.Impostor";
    const TYPE_TAG: i32 = 0x5a5a_0004;
    const FIELD_COUNT: usize = 2;

    fn mark_present(&self, mask: &mut PresenceMask) {
        mask.set_if(0, !self.x.is_default());
        mask.set_if(1, !self.y.is_default());
    }

    fn write_present(&self, mask: &PresenceMask, w: &mut WireWriter) -> Result<()> {
        if mask.is_set(0) {
            self.x.write_to(w)?;
        }
        if mask.is_set(1) {
            self.y.write_to(w)?;
        }
        Ok(())
    }

    fn read_present(&mut self, mask: &PresenceMask, r: &mut WireReader<'_>) -> Result<()> {
        if mask.is_set(0) {
            self.x = WireValue::read_from(r)?;
        }
        if mask.is_set(1) {
            self.y = WireValue::read_from(r)?;
        }
        Ok(())
    }
}

/// Collides with `Point` on purpose
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clash;

impl WireMessage for Clash {
    const TYPE_NAME: &'static str = "test.Clash";
    const TYPE_TAG: i32 = Point::TYPE_TAG;
    const FIELD_COUNT: usize = 0;

    fn mark_present(&self, _mask: &mut PresenceMask) {}

    fn write_present(&self, _mask: &PresenceMask, _w: &mut WireWriter) -> Result<()> {
        Ok(())
    }

    fn read_present(&mut self, _mask: &PresenceMask, _r: &mut WireReader<'_>) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Empty;

impl WireMessage for Empty {
    const TYPE_NAME: &'static str = "test.Empty";
    const TYPE_TAG: i32 = 0x5a5a_0005;
    const FIELD_COUNT: usize = 0;

    fn mark_present(&self, _mask: &mut PresenceMask) {}

    fn write_present(&self, _mask: &PresenceMask, _w: &mut WireWriter) -> Result<()> {
        Ok(())
    }

    fn read_present(&mut self, _mask: &PresenceMask, _r: &mut WireReader<'_>) -> Result<()> {
        Ok(())
    }
}

pub fn full_sample() -> Sample {
    Sample {
        id: 42,
        big: -9_000_000_000,
        ratio: 0.5,
        score: 3.25,
        flag: true,
        name: "héllo".to_string(),
        pos: Vector3::new(1.0, -2.0, 3.5),
        at: Timestamp::from_millis(1_700_000_000_123),
        tags: vec!["a".to_string(), String::new(), "c".to_string()],
        origin: Some(Box::new(Point { x: 1, y: 2 })),
        path: vec![Point { x: 3, y: 0 }, Point::default()],
    }
}
