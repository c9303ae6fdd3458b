//! Export of a [`Framebuffer`] as a binary PPM (P6) image.

use std::io::{self, Write};

use g1_vm::raster::{Framebuffer, Surface};

/// Writes `frame` to `out`, every pixel scaled up to a `scale`×`scale` square.
///
/// The alpha channel is dropped. Each line of `comment` becomes a comment of the header. Fails
/// with [`io::ErrorKind::InvalidInput`] if the scaled size overflows.
pub fn write_ppm<W: Write>(
    out: &mut W,
    frame: &Framebuffer,
    scale: usize,
    comment: Option<&str>,
) -> io::Result<()> {
    let dimensions = frame
        .width()
        .checked_mul(scale)
        .zip(frame.height().checked_mul(scale))
        .filter(|(width, _)| width.checked_mul(3).is_some());
    let Some((width, height)) = dimensions else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "scaled image is too large",
        ));
    };

    writeln!(out, "P6")?;
    for line in comment.into_iter().flat_map(str::lines) {
        writeln!(out, "# {line}")?;
    }
    writeln!(out, "{width} {height}")?;
    writeln!(out, "255")?;

    let mut row = Vec::with_capacity(width * 3);
    for y in 0..frame.height() {
        row.clear();
        for x in 0..frame.width() {
            let color = frame.pixel(x, y);
            for _ in 0..scale {
                row.extend_from_slice(&[color.r, color.g, color.b]);
            }
        }
        for _ in 0..scale {
            out.write_all(&row)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use g1_vm::raster::Color;

    use super::*;

    #[test]
    fn header_and_pixels() {
        let mut frame = Framebuffer::new(2, 1);
        frame.draw_point(1, 0, Color::rgb(1, 2, 3));

        let mut out = Vec::new();
        write_ppm(&mut out, &frame, 1, Some("demo")).unwrap();

        let mut expected = b"P6\n# demo\n2 1\n255\n".to_vec();
        expected.extend_from_slice(&[0, 0, 0, 1, 2, 3]);
        assert_eq!(out, expected);
    }

    #[test]
    fn scaled() {
        let mut frame = Framebuffer::new(2, 1);
        frame.draw_point(0, 0, Color::rgb(9, 8, 7));

        let mut out = Vec::new();
        write_ppm(&mut out, &frame, 2, None).unwrap();

        let mut expected = b"P6\n4 2\n255\n".to_vec();
        let row = [9, 8, 7, 9, 8, 7, 0, 0, 0, 0, 0, 0];
        expected.extend_from_slice(&row);
        expected.extend_from_slice(&row);
        assert_eq!(out, expected);
    }

    #[test]
    fn overflowing_scale() {
        let frame = Framebuffer::new(2, 1);
        let mut out = Vec::<u8>::new();

        let err = write_ppm(&mut out, &frame, usize::MAX, None).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(out.is_empty());
    }
}
