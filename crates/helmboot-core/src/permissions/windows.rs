//! Windows ACL backend

use std::ffi::{OsStr, c_void};
use std::io;
use std::os::windows::ffi::OsStrExt;
use std::path::Path;

use windows::Win32::Foundation::{HLOCAL, LocalFree, WIN32_ERROR};
use windows::Win32::Security::Authorization::{
    DENY_ACCESS, EXPLICIT_ACCESS_W, GRANT_ACCESS, GetExplicitEntriesFromAclW,
    GetNamedSecurityInfoW, NO_MULTIPLE_TRUSTEE, SE_FILE_OBJECT, SetEntriesInAclW,
    SetNamedSecurityInfoW, TRUSTEE_IS_NAME, TRUSTEE_IS_SID, TRUSTEE_IS_UNKNOWN, TRUSTEE_W,
};
use windows::Win32::Security::{
    ACE_FLAGS, ACL, DACL_SECURITY_INFORMATION, GetLengthSid, IsValidSid, PSECURITY_DESCRIPTOR,
    PSID,
};
use windows::Win32::System::WindowsProgramming::GetUserNameW;
use windows::core::{PCWSTR, PWSTR};

use super::{AclBackend, AclEntry, AclEntryType, Principal};

/// ACL access through the Win32 security API.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsAcl;

impl AclBackend for WindowsAcl {
    fn current_principal(&self) -> io::Result<Principal> {
        let mut len = 0u32;
        // First call reports the required buffer length
        let _ = unsafe { GetUserNameW(None, &mut len) };
        let mut buffer = vec![0u16; len as usize];
        unsafe { GetUserNameW(Some(PWSTR(buffer.as_mut_ptr())), &mut len) }
            .map_err(io::Error::other)?;
        Ok(Principal::Name(from_wide(&buffer)))
    }

    fn read_acl(&self, path: &Path) -> io::Result<Vec<AclEntry>> {
        let wide = to_wide(path.as_os_str());
        let mut dacl: *mut ACL = std::ptr::null_mut();
        let mut descriptor = PSECURITY_DESCRIPTOR::default();

        unsafe {
            check(GetNamedSecurityInfoW(
                PCWSTR(wide.as_ptr()),
                SE_FILE_OBJECT,
                DACL_SECURITY_INFORMATION,
                None,
                None,
                Some(&mut dacl as *mut *mut ACL),
                None,
                &mut descriptor,
            ))?;
        }
        // The DACL points into the descriptor, so it lives as long as this guard
        let _descriptor = LocalBuffer(descriptor.0);

        let mut count = 0u32;
        let mut explicit: *mut EXPLICIT_ACCESS_W = std::ptr::null_mut();
        unsafe {
            check(GetExplicitEntriesFromAclW(dacl, &mut count, &mut explicit))?;
        }
        let _explicit = LocalBuffer(explicit.cast());

        (0..count as usize)
            .map(|i| {
                let access = unsafe { &*explicit.add(i) };
                read_entry(access)
            })
            .collect()
    }

    fn write_acl(&self, path: &Path, entries: &[AclEntry]) -> io::Result<()> {
        let trustees: Vec<TrusteeBuffer> = entries
            .iter()
            .map(|e| TrusteeBuffer::new(&e.principal))
            .collect();
        let explicit: Vec<EXPLICIT_ACCESS_W> = entries
            .iter()
            .zip(&trustees)
            .map(|(entry, trustee)| EXPLICIT_ACCESS_W {
                grfAccessPermissions: entry.mask,
                grfAccessMode: match entry.kind {
                    AclEntryType::Allow => GRANT_ACCESS,
                    AclEntryType::Deny => DENY_ACCESS,
                },
                grfInheritance: ACE_FLAGS(entry.inheritance),
                Trustee: trustee.as_trustee(),
            })
            .collect();

        let mut acl: *mut ACL = std::ptr::null_mut();
        unsafe {
            check(SetEntriesInAclW(Some(&explicit), None, &mut acl))?;
        }
        let _acl = LocalBuffer(acl.cast());

        let wide = to_wide(path.as_os_str());
        unsafe {
            check(SetNamedSecurityInfoW(
                PCWSTR(wide.as_ptr()),
                SE_FILE_OBJECT,
                DACL_SECURITY_INFORMATION,
                None,
                None,
                Some(acl.cast_const()),
                None,
            ))
        }
    }
}

fn read_entry(access: &EXPLICIT_ACCESS_W) -> io::Result<AclEntry> {
    // GRANT_ACCESS and SET_ACCESS both read back as grants
    let kind = if access.grfAccessMode == DENY_ACCESS {
        AclEntryType::Deny
    } else {
        AclEntryType::Allow
    };

    let name = access.Trustee.ptstrName;
    let principal = match access.Trustee.TrusteeForm {
        TRUSTEE_IS_SID => Principal::Sid(sid_bytes(PSID(name.0.cast()))?),
        TRUSTEE_IS_NAME => Principal::Name(unsafe { String::from_utf16_lossy(name.as_wide()) }),
        form => {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("trustee form {} is not handled", form.0),
            ));
        }
    };

    Ok(AclEntry {
        principal,
        kind,
        mask: access.grfAccessPermissions,
        inheritance: access.grfInheritance.0,
    })
}

fn sid_bytes(sid: PSID) -> io::Result<Vec<u8>> {
    if !unsafe { IsValidSid(sid) }.as_bool() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "access entry carries an invalid SID",
        ));
    }
    let len = unsafe { GetLengthSid(sid) } as usize;
    let bytes = unsafe { std::slice::from_raw_parts(sid.0.cast::<u8>(), len) };
    Ok(bytes.to_vec())
}

/// Memory returned by the security API, released with `LocalFree`.
struct LocalBuffer(*mut c_void);

impl Drop for LocalBuffer {
    fn drop(&mut self) {
        if !self.0.is_null() {
            unsafe {
                let _ = LocalFree(Some(HLOCAL(self.0)));
            }
        }
    }
}

/// Owned storage a `TRUSTEE_W` points into while the list is built.
enum TrusteeBuffer {
    Name(Vec<u16>),
    // u32 words keep the SID aligned for its sub-authority array
    Sid(Vec<u32>),
}

impl TrusteeBuffer {
    fn new(principal: &Principal) -> Self {
        match principal {
            Principal::Name(name) => TrusteeBuffer::Name(to_wide(OsStr::new(name))),
            Principal::Sid(bytes) => {
                let mut words = vec![0u32; bytes.len().div_ceil(4)];
                for (i, chunk) in bytes.chunks(4).enumerate() {
                    let mut word = [0u8; 4];
                    word[..chunk.len()].copy_from_slice(chunk);
                    words[i] = u32::from_ne_bytes(word);
                }
                TrusteeBuffer::Sid(words)
            }
        }
    }

    fn as_trustee(&self) -> TRUSTEE_W {
        let (form, ptr) = match self {
            TrusteeBuffer::Name(wide) => (TRUSTEE_IS_NAME, wide.as_ptr().cast_mut()),
            TrusteeBuffer::Sid(words) => (TRUSTEE_IS_SID, words.as_ptr().cast_mut().cast()),
        };
        TRUSTEE_W {
            pMultipleTrustee: std::ptr::null_mut(),
            MultipleTrusteeOperation: NO_MULTIPLE_TRUSTEE,
            TrusteeForm: form,
            TrusteeType: TRUSTEE_IS_UNKNOWN,
            ptstrName: PWSTR(ptr),
        }
    }
}

fn check(status: WIN32_ERROR) -> io::Result<()> {
    if status.is_ok() {
        Ok(())
    } else {
        Err(io::Error::from_raw_os_error(status.0 as i32))
    }
}

fn to_wide(value: &OsStr) -> Vec<u16> {
    value.encode_wide().chain(std::iter::once(0)).collect()
}

fn from_wide(buffer: &[u16]) -> String {
    let end = buffer.iter().position(|c| *c == 0).unwrap_or(buffer.len());
    String::from_utf16_lossy(&buffer[..end])
}
