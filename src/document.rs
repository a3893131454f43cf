//! Assembling a VTK XML document.
//!
//! Markup is written through a `quick_xml` writer into an in-memory head buffer.
//! Arrays that go to the appended section are not encoded right away: their
//! `DataArray` element gets an `offset` attribute without a value and the array
//! is queued. Once the markup is complete, [`DocumentWriter::finish`] drains the
//! queue in the order the arrays were added, fills in the offsets, and writes
//! the head followed by the `AppendedData` section to the sink.
//!
//! Nothing reaches the sink before `finish`, so a failure anywhere before it
//! leaves no partial output behind.

use crate::error::Error;
use crate::field::{FieldData, FieldShape};
use crate::options::{DataFormat, ResolvedOptions};

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::Writer;

use std::borrow::Cow;
use std::collections::VecDeque;
use std::io::Write;

const INDENT: usize = 2;

/// An array waiting for its bytes to be written to the appended section
#[derive(Debug)]
struct PendingArray {
    name: String,
    data: FieldData,
    /// position in the head where the offset value has to be inserted
    position: usize,
}

pub(crate) struct DocumentWriter {
    xml: Writer<Vec<u8>>,
    options: ResolvedOptions,
    pending: VecDeque<PendingArray>,
}

impl DocumentWriter {
    pub(crate) fn new(options: ResolvedOptions) -> Self {
        Self {
            xml: Writer::new_with_indent(Vec::new(), b' ', INDENT),
            options,
            pending: VecDeque::new(),
        }
    }

    /// Write the xml declaration and open the `VTKFile` element
    pub(crate) fn start_document(&mut self, grid_type: &str, version: &str) -> Result<(), Error> {
        self.xml.write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;

        let codec = self.options.codec;
        let header_type = codec.header.precision().vtk_name();
        let mut attributes = vec![
            ("type", grid_type),
            ("version", version),
            ("byte_order", codec.byte_order.vtk_name()),
            ("header_type", header_type.as_str()),
        ];

        if let Some(compressor) = codec.compressor.vtk_name() {
            attributes.push(("compressor", compressor));
        }

        self.open("VTKFile", &attributes)
    }

    pub(crate) fn open(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), Error> {
        let start = BytesStart::new(name).with_attributes(attributes.iter().copied());
        self.xml.write_event(Event::Start(start))?;
        Ok(())
    }

    pub(crate) fn close(&mut self, name: &str) -> Result<(), Error> {
        self.xml.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    /// write a self-closing element
    pub(crate) fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), Error> {
        let start = BytesStart::new(name).with_attributes(attributes.iter().copied());
        self.xml.write_event(Event::Empty(start))?;
        Ok(())
    }

    /// Write a `DataArray` holding `data`, either inline or as a reference into
    /// the appended section.
    pub(crate) fn data_array(&mut self, name: &str, data: FieldData, shape: FieldShape) -> Result<(), Error> {
        self.array_element(name, data, shape, None)
    }

    /// Write a `DataArray` of the `FieldData` section, which counts tuples
    /// instead of components
    pub(crate) fn meta_data_array(&mut self, name: &str, data: FieldData) -> Result<(), Error> {
        let tuples = data.len();
        self.array_element(name, data, FieldShape::Scalar, Some(tuples))
    }

    fn array_element(
        &mut self,
        name: &str,
        data: FieldData,
        shape: FieldShape,
        tuples: Option<usize>,
    ) -> Result<(), Error> {
        let precision = data.precision().vtk_name();
        let components = shape.number_of_components().to_string();
        let tuples = tuples.map(|n| n.to_string());

        let mut start = BytesStart::new("DataArray");
        start.push_attribute(("type", precision.as_str()));
        start.push_attribute(("Name", name));
        match &tuples {
            Some(tuples) => start.push_attribute(("NumberOfTuples", tuples.as_str())),
            None => start.push_attribute(("NumberOfComponents", components.as_str())),
        }

        let codec = self.options.codec;

        match self.options.data_format {
            DataFormat::Inlined => {
                let format = if codec.encoder.is_ascii() { "ascii" } else { "binary" };
                start.push_attribute(("format", format));

                let encoded = codec.encode(&data)?;
                // both ascii and base64 output is plain ascii
                let text = String::from_utf8_lossy(&encoded);

                self.xml.write_event(Event::Start(start))?;
                self.xml.write_event(Event::Text(BytesText::new(&text)))?;
                self.xml.write_event(Event::End(BytesEnd::new("DataArray")))?;
            }
            DataFormat::Appended => {
                start.push_attribute(("format", "appended"));
                start.push_attribute(Attribute {
                    key: QName(b"offset"),
                    value: Cow::Borrowed(b""),
                });

                let element_start = self.xml.inner().len();
                self.xml.write_event(Event::Empty(start))?;
                let position = offset_position(&self.xml.inner()[element_start..])
                    .map(|p| element_start + p)
                    .ok_or_else(|| Error::Document(format!("`{}` has no offset attribute to fill in", name)))?;

                tracing::trace!(name, position, "queued appended array");

                self.pending.push_back(PendingArray {
                    name: name.to_string(),
                    data,
                    position,
                });
            }
        }

        Ok(())
    }

    /// number of arrays waiting to be written to the appended section
    pub(crate) fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Close the `VTKFile` element, resolve all offsets, and write the complete
    /// document to `sink`.
    pub(crate) fn finish<W: Write>(self, sink: &mut W) -> Result<(), Error> {
        let Self {
            mut xml,
            options,
            mut pending,
        } = self;

        if pending.is_empty() {
            xml.write_event(Event::End(BytesEnd::new("VTKFile")))?;
            sink.write_all(&xml.into_inner())?;
            return Ok(());
        }

        let head = xml.into_inner();
        let mut appendix = Vec::new();
        let mut document = Vec::with_capacity(head.len());
        let mut copied = 0;
        let mut next_offset = 0;

        // drain strictly in insertion order, the offset of each array is the
        // length of everything appended before it
        while let Some(array) = pending.pop_front() {
            let encoded = options.codec.encode(&array.data)?;

            document.extend_from_slice(&head[copied..array.position]);
            document.extend_from_slice(next_offset.to_string().as_bytes());
            copied = array.position;

            tracing::debug!(
                name = array.name.as_str(),
                offset = next_offset,
                length = encoded.len(),
                "appended array"
            );

            appendix.extend_from_slice(&encoded);
            next_offset += encoded.len();
        }
        document.extend_from_slice(&head[copied..]);

        sink.write_all(&document)?;
        appended_binary_header_start(sink, options.codec.encoder.vtk_name())?;
        sink.write_all(&appendix)?;
        appended_binary_header_end(sink)?;
        sink.write_all(b"\n</VTKFile>\n")?;

        Ok(())
    }
}

/// position right after `offset="` within a single element
fn offset_position(element: &[u8]) -> Option<usize> {
    const KEY: &[u8] = b"offset=\"";
    element
        .windows(KEY.len())
        .rposition(|window| window == KEY)
        .map(|p| p + KEY.len())
}

fn appended_binary_header_start<W: Write>(sink: &mut W, encoding: &str) -> Result<(), std::io::Error> {
    write!(sink, "\n{:indent$}<AppendedData encoding=\"{}\">\n{:data$}_", "", encoding, "", indent = INDENT, data = 2 * INDENT)
}

fn appended_binary_header_end<W: Write>(sink: &mut W) -> Result<(), std::io::Error> {
    write!(sink, "\n{:indent$}</AppendedData>", "", indent = INDENT)
}
