//! Block layout: header-prefixed allocations and the free-list link.
//!
//! Every block handed to a caller is a single system allocation of the
//! shape `[Header | payload]`. The header records the size class and
//! the total block size (`std::alloc::dealloc` needs the layout back,
//! unlike C `free`), and its alignment fixes the payload at a 16-byte
//! boundary.
//!
//! While a block sits in a free-list its payload is unused, so the
//! first payload word is reinterpreted as the "next" link of an
//! intrusive singly-linked list. This module is the single point of
//! that reinterpretation; the link word is zeroed again when the block
//! leaves the list.

use std::alloc::Layout;
use std::ptr::NonNull;

use poolfront_core::size_class::{BLOCK_ALIGN, HEADER_SIZE, STEP};

/// Metadata prefixed to every block.
///
/// `align(16)` both pads the header to exactly [`HEADER_SIZE`] bytes
/// and guarantees the payload that follows is 16-byte aligned.
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy)]
pub struct Header {
    /// Size class of the payload; `>= NUM_CLASSES` means unpooled.
    pub class: usize,
    /// Full block size in bytes (header included), as handed to the
    /// system allocator.
    pub total: usize,
}

const _: () = assert!(std::mem::size_of::<Header>() == HEADER_SIZE);
const _: () = assert!(std::mem::align_of::<Header>() == BLOCK_ALIGN);
// The link word must fit in the smallest pooled payload.
const _: () = assert!(STEP >= std::mem::size_of::<*mut Header>());

/// Layout for a block of `total` bytes. `None` if `total` overflows
/// when rounded up to the block alignment.
#[inline]
pub fn layout_for(total: usize) -> Option<Layout> {
    Layout::from_size_align(total, BLOCK_ALIGN).ok()
}

/// Payload pointer for a block.
#[inline]
#[must_use]
pub fn payload_of(block: NonNull<Header>) -> NonNull<u8> {
    // SAFETY: every block is at least HEADER_SIZE bytes, so the payload
    // offset stays within (or one past) the allocation and is non-null.
    unsafe { NonNull::new_unchecked(block.as_ptr().cast::<u8>().add(HEADER_SIZE)) }
}

/// Recovers the block from a payload pointer previously returned by
/// [`payload_of`] / [`stamp`].
///
/// # Safety
///
/// `payload` must point at the payload of a live block produced by this
/// module; anything else reads out of bounds.
#[inline]
#[must_use]
pub unsafe fn header_of(payload: NonNull<u8>) -> NonNull<Header> {
    // SAFETY: the header sits exactly HEADER_SIZE bytes before the
    // payload of every block, per the caller's contract.
    unsafe { NonNull::new_unchecked(payload.as_ptr().sub(HEADER_SIZE).cast::<Header>()) }
}

/// Stamps the header of a block and returns its payload pointer.
///
/// # Safety
///
/// `block` must point at least `HEADER_SIZE` writable bytes owned by
/// the allocator (fresh from the system allocator or popped off a
/// free-list).
#[inline]
pub unsafe fn stamp(block: NonNull<Header>, class: usize, total: usize) -> NonNull<u8> {
    // SAFETY: the block's first HEADER_SIZE bytes are ours to write.
    unsafe {
        block.as_ptr().write(Header { class, total });
    }
    payload_of(block)
}

/// Writes the free-list link into the first payload word.
///
/// # Safety
///
/// `block` must be a stamped pooled block whose payload is no longer
/// owned by any caller; the link overwrites payload bytes.
#[inline]
pub unsafe fn set_free_link(block: NonNull<Header>, next: *mut Header) {
    // SAFETY: pooled payloads are at least STEP >= pointer-size bytes
    // and BLOCK_ALIGN-aligned, so the first word holds a pointer.
    unsafe {
        payload_of(block).cast::<*mut Header>().write(next);
    }
}

/// Reads and clears the free-list link of a block leaving a free-list.
///
/// The link word is zeroed so a recycled payload never leaks a heap
/// address to its next owner.
///
/// # Safety
///
/// `block` must currently be a free-list member written by
/// [`set_free_link`].
#[inline]
pub unsafe fn take_free_link(block: NonNull<Header>) -> *mut Header {
    let word = payload_of(block).cast::<*mut Header>();
    // SAFETY: same location set_free_link wrote; still owned by the pool.
    unsafe {
        let next = word.read();
        word.write(std::ptr::null_mut());
        next
    }
}

/// Reads the free-list link without removing the block.
///
/// # Safety
///
/// Same contract as [`take_free_link`].
#[inline]
#[must_use]
pub unsafe fn free_link(block: NonNull<Header>) -> *mut Header {
    // SAFETY: per the caller's contract the word holds a link.
    unsafe { payload_of(block).cast::<*mut Header>().read() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poolfront_core::size_class::block_size;

    fn sys_block(class: usize) -> NonNull<Header> {
        let layout = layout_for(block_size(class)).expect("valid test layout");
        // SAFETY: layout has nonzero size.
        let raw = unsafe { std::alloc::alloc(layout) };
        NonNull::new(raw.cast::<Header>()).expect("test allocation")
    }

    unsafe fn sys_release(block: NonNull<Header>, class: usize) {
        let layout = layout_for(block_size(class)).expect("valid test layout");
        // SAFETY: block came from sys_block with the same layout.
        unsafe { std::alloc::dealloc(block.as_ptr().cast::<u8>(), layout) };
    }

    #[test]
    fn payload_header_roundtrip() {
        let block = sys_block(3);
        let payload = unsafe { stamp(block, 3, block_size(3)) };
        assert_eq!(payload.as_ptr() as usize, block.as_ptr() as usize + HEADER_SIZE);
        assert_eq!(payload.as_ptr() as usize % BLOCK_ALIGN, 0);

        let recovered = unsafe { header_of(payload) };
        assert_eq!(recovered, block);
        let hdr = unsafe { recovered.as_ref() };
        assert_eq!(hdr.class, 3);
        assert_eq!(hdr.total, block_size(3));

        unsafe { sys_release(block, 3) };
    }

    #[test]
    fn free_link_set_and_take() {
        let a = sys_block(0);
        let b = sys_block(0);
        unsafe {
            stamp(a, 0, block_size(0));
            stamp(b, 0, block_size(0));

            set_free_link(a, b.as_ptr());
            assert_eq!(free_link(a), b.as_ptr());

            let next = take_free_link(a);
            assert_eq!(next, b.as_ptr());
            // The link word is scrubbed on the way out.
            assert_eq!(free_link(a), std::ptr::null_mut());

            sys_release(a, 0);
            sys_release(b, 0);
        }
    }

    #[test]
    fn restamp_survives_free_link() {
        // The link lives in the payload, so the class stamp is intact
        // even while the block is list-resident.
        let block = sys_block(7);
        unsafe {
            stamp(block, 7, block_size(7));
            set_free_link(block, std::ptr::null_mut());
            assert_eq!(block.as_ref().class, 7);
            take_free_link(block);
            let payload = stamp(block, 7, block_size(7));
            assert_eq!(payload, payload_of(block));
            sys_release(block, 7);
        }
    }
}
